
use anyhow::anyhow;
use humantime::parse_duration;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Result<T> = anyhow::Result<T>;

// TOML configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    #[serde(default = "default_rpc_addr")]
    pub rpc_addr: String,
    #[serde(default = "default_rpc_workers")]
    pub rpc_workers: usize,
    #[serde(default = "default_forecast_timeout")]
    pub forecast_timeout: String,
    #[serde(default = "default_max_periods")]
    pub max_periods: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_rust_log_format")]
    pub rust_log_format: String,
}

fn default_http_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_rpc_addr() -> String {
    "0.0.0.0:50051".to_string()
}
fn default_rpc_workers() -> usize {
    10
}
fn default_forecast_timeout() -> String {
    "60s".to_string()
}
fn default_max_periods() -> usize {
    10_000
}
fn default_rust_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            rpc_addr: default_rpc_addr(),
            rpc_workers: default_rpc_workers(),
            forecast_timeout: default_forecast_timeout(),
            max_periods: default_max_periods(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log_format: default_rust_log_format(),
        }
    }
}

static CONFIG: Lazy<Config> = Lazy::new(|| {
    load_config().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config files: {}. Using defaults.",
            e
        );
        Config::default()
    })
});

static CONFIG_STORE: Lazy<Arc<Mutex<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

pub fn get(name: &str) -> Result<String> {
    // Priority 1: CONFIG_STORE (runtime overrides)
    if let Some(value) = get_from_store(name) {
        if value.is_empty() {
            return Err(anyhow!("{} is empty", name));
        }
        return Ok(value);
    }

    // Priority 2: Environment variables
    if let Ok(val) = std::env::var(name)
        && !val.is_empty()
    {
        return Ok(val);
    }

    // Priority 3: TOML config
    lookup(&CONFIG, name).ok_or_else(|| anyhow!("Configuration key not found: {}", name))
}

fn lookup(config: &Config, name: &str) -> Option<String> {
    let value = match name {
        "HTTP_ADDR" => config.server.http_addr.clone(),
        "RPC_ADDR" => config.server.rpc_addr.clone(),
        "RPC_WORKERS" => config.server.rpc_workers.to_string(),
        "FORECAST_TIMEOUT" => config.server.forecast_timeout.clone(),
        "MAX_PERIODS" => config.server.max_periods.to_string(),
        "RUST_LOG_FORMAT" => config.logging.rust_log_format.clone(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

pub fn set(name: &str, value: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.insert(name.to_string(), value.to_string());
    }
}

pub fn unset(name: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.remove(name);
    }
}

fn get_from_store(name: &str) -> Option<String> {
    if let Ok(store) = CONFIG_STORE.lock() {
        store.get(name).cloned()
    } else {
        None
    }
}

pub fn http_addr() -> SocketAddr {
    parsed("HTTP_ADDR", default_http_addr())
}

pub fn rpc_addr() -> SocketAddr {
    parsed("RPC_ADDR", default_rpc_addr())
}

pub fn rpc_workers() -> usize {
    get("RPC_WORKERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(default_rpc_workers)
}

pub fn forecast_timeout() -> Duration {
    get("FORECAST_TIMEOUT")
        .and_then(|v| Ok(parse_duration(&v)?))
        .unwrap_or_else(|_| Duration::from_secs(60))
}

/// Upper bound on the forecast horizon of a single request.
pub fn max_periods() -> usize {
    get("MAX_PERIODS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(default_max_periods)
}

fn parsed(name: &str, fallback: String) -> SocketAddr {
    get(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| {
            fallback
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)))
        })
}

/// Load configuration from TOML files with priority:
/// 1. config/config.local.toml (git-ignored, for local overrides)
/// 2. config/config.toml (git-managed template)
/// 3. Default values
fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let base_path = "config/config.toml";
    if Path::new(base_path).exists() {
        let content = fs::read_to_string(base_path)?;
        config = toml::from_str(&content)?;
    }

    let local_path = "config/config.local.toml";
    if Path::new(local_path).exists() {
        let content = fs::read_to_string(local_path)?;
        let local_config: Config = toml::from_str(&content)?;
        merge_config(&mut config, local_config);
    }

    Ok(config)
}

/// Merge local config into base config (local values override base values)
fn merge_config(base: &mut Config, local: Config) {
    if local.server.http_addr != default_http_addr() {
        base.server.http_addr = local.server.http_addr;
    }
    if local.server.rpc_addr != default_rpc_addr() {
        base.server.rpc_addr = local.server.rpc_addr;
    }
    if local.server.rpc_workers != default_rpc_workers() {
        base.server.rpc_workers = local.server.rpc_workers;
    }
    if local.server.forecast_timeout != default_forecast_timeout() {
        base.server.forecast_timeout = local.server.forecast_timeout;
    }
    if local.server.max_periods != default_max_periods() {
        base.server.max_periods = local.server.max_periods;
    }

    if local.logging.rust_log_format != default_rust_log_format() {
        base.logging.rust_log_format = local.logging.rust_log_format;
    }
}
