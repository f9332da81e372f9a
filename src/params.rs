#[cfg(test)]
mod tests;

mod schema;

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CHANGEPOINT_PRIOR_SCALE: f64 = 0.05;
pub const DEFAULT_SEASONALITY_PRIOR_SCALE: f64 = 10.0;
pub const DEFAULT_HOLIDAYS_PRIOR_SCALE: f64 = 10.0;
pub const DEFAULT_N_CHANGEPOINTS: usize = 25;
pub const DEFAULT_CHANGEPOINT_RANGE: f64 = 0.8;

/// Model options as they arrive on the wire.
///
/// Every field is optional in the payload and falls back to its default.
/// Nothing is checked here; convert into [`ModelConfig`] to validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub holidays_prior_scale: f64,
    pub seasonality_mode: String,
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub growth: String,
    pub cap: Option<f64>,
    pub floor: Option<f64>,
    pub n_changepoints: i64,
    pub changepoint_range: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: DEFAULT_CHANGEPOINT_PRIOR_SCALE,
            seasonality_prior_scale: DEFAULT_SEASONALITY_PRIOR_SCALE,
            holidays_prior_scale: DEFAULT_HOLIDAYS_PRIOR_SCALE,
            seasonality_mode: SeasonalityMode::Additive.to_string(),
            yearly_seasonality: true,
            weekly_seasonality: true,
            daily_seasonality: false,
            growth: Growth::Linear.name().to_string(),
            cap: None,
            floor: None,
            n_changepoints: DEFAULT_N_CHANGEPOINTS as i64,
            changepoint_range: DEFAULT_CHANGEPOINT_RANGE,
        }
    }
}

impl ModelParameters {
    /// JSON schema of the accepted fields, with defaults and constraints.
    pub fn json_schema() -> serde_json::Value {
        schema::build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    Additive,
    Multiplicative,
}

impl SeasonalityMode {
    pub const NAMES: [&'static str; 2] = ["additive", "multiplicative"];
}

impl fmt::Display for SeasonalityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonalityMode::Additive => write!(f, "additive"),
            SeasonalityMode::Multiplicative => write!(f, "multiplicative"),
        }
    }
}

impl FromStr for SeasonalityMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "additive" => Ok(SeasonalityMode::Additive),
            "multiplicative" => Ok(SeasonalityMode::Multiplicative),
            other => Err(Error::validation(format!(
                "seasonality_mode must be one of {}, got {other:?}",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Saturation bounds for logistic growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capacity {
    pub cap: f64,
    pub floor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    Linear,
    Flat,
    Logistic(Capacity),
}

impl Growth {
    pub const NAMES: [&'static str; 3] = ["linear", "logistic", "flat"];

    pub fn name(&self) -> &'static str {
        match self {
            Growth::Linear => "linear",
            Growth::Flat => "flat",
            Growth::Logistic(_) => "logistic",
        }
    }

    pub fn capacity(&self) -> Option<Capacity> {
        match self {
            Growth::Logistic(capacity) => Some(*capacity),
            _ => None,
        }
    }

    fn parse(name: &str, cap: Option<f64>, floor: Option<f64>) -> Result<Self, Error> {
        match name {
            "linear" => Ok(Growth::Linear),
            "flat" => Ok(Growth::Flat),
            "logistic" => match (cap, floor) {
                (Some(cap), Some(floor)) => {
                    if !cap.is_finite() || !floor.is_finite() {
                        return Err(Error::validation("cap and floor must be finite numbers"));
                    }
                    Ok(Growth::Logistic(Capacity { cap, floor }))
                }
                _ => Err(Error::input(
                    "Cap and floor must be specified for logistic growth",
                )),
            },
            other => Err(Error::validation(format!(
                "growth must be one of {}, got {other:?}",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Validated model options.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub holidays_prior_scale: f64,
    pub seasonality_mode: SeasonalityMode,
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub growth: Growth,
    pub n_changepoints: usize,
    pub changepoint_range: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: DEFAULT_CHANGEPOINT_PRIOR_SCALE,
            seasonality_prior_scale: DEFAULT_SEASONALITY_PRIOR_SCALE,
            holidays_prior_scale: DEFAULT_HOLIDAYS_PRIOR_SCALE,
            seasonality_mode: SeasonalityMode::Additive,
            yearly_seasonality: true,
            weekly_seasonality: true,
            daily_seasonality: false,
            growth: Growth::Linear,
            n_changepoints: DEFAULT_N_CHANGEPOINTS,
            changepoint_range: DEFAULT_CHANGEPOINT_RANGE,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<f64, Error> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::validation(format!(
            "{name} must be greater than 0, got {value}"
        )))
    }
}

impl TryFrom<ModelParameters> for ModelConfig {
    type Error = Error;

    fn try_from(params: ModelParameters) -> Result<Self, Self::Error> {
        let changepoint_prior_scale =
            positive("changepoint_prior_scale", params.changepoint_prior_scale)?;
        let seasonality_prior_scale =
            positive("seasonality_prior_scale", params.seasonality_prior_scale)?;
        let holidays_prior_scale = positive("holidays_prior_scale", params.holidays_prior_scale)?;
        let seasonality_mode = params.seasonality_mode.parse()?;

        let n_changepoints = usize::try_from(params.n_changepoints).map_err(|_| {
            Error::validation(format!(
                "n_changepoints must be greater than or equal to 0, got {}",
                params.n_changepoints
            ))
        })?;

        let range = params.changepoint_range;
        if !(range.is_finite() && range > 0.0 && range <= 1.0) {
            return Err(Error::validation(format!(
                "changepoint_range must be in (0, 1], got {range}"
            )));
        }

        let growth = Growth::parse(&params.growth, params.cap, params.floor)?;

        Ok(Self {
            changepoint_prior_scale,
            seasonality_prior_scale,
            holidays_prior_scale,
            seasonality_mode,
            yearly_seasonality: params.yearly_seasonality,
            weekly_seasonality: params.weekly_seasonality,
            daily_seasonality: params.daily_seasonality,
            growth,
            n_changepoints,
            changepoint_range: range,
        })
    }
}
