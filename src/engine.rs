//! Contract between the orchestrator and a forecasting engine.
//!
//! The orchestrator only ever talks to [`EngineFactory`] and
//! [`ForecastEngine`]: build one engine per request from [`EngineOptions`],
//! fit it on a history [`Frame`], ask it for the future frame, predict, and
//! read the resulting [`PredictionTable`] back by column name.


mod additive;
mod frequency;

pub use additive::AdditiveModel;
pub use frequency::Frequency;

use crate::frame::Frame;
use crate::params::{Growth, ModelConfig, SeasonalityMode};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use thiserror::Error;

pub const YHAT: &str = "yhat";
pub const YHAT_LOWER: &str = "yhat_lower";
pub const YHAT_UPPER: &str = "yhat_upper";
pub const TREND: &str = "trend";

/// Columns that may be returned as decomposed components, in response order.
pub const COMPONENTS: [&str; 4] = [TREND, "yearly", "weekly", "daily"];

pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.8;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Dataframe has less than 2 non-NaN rows.")]
    InsufficientData,
    #[error("history spans no time: at least two distinct timestamps are required")]
    ZeroSpan,
    #[error("Model has not been fit.")]
    NotFitted,
    #[error("Capacities must be supplied for logistic growth in column \"cap\"")]
    MissingCapacity,
    #[error("cap must be greater than floor, got cap {cap} and floor {floor}")]
    InvalidCapacity { cap: f64, floor: f64 },
    #[error("model fitting failed: {0}")]
    Fit(String),
    #[error("cannot generate future dates: {0}")]
    FutureDates(String),
}

/// Construction parameters of an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub growth: Growth,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub holidays_prior_scale: f64,
    pub seasonality_mode: SeasonalityMode,
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub interval_width: f64,
}

impl From<&ModelConfig> for EngineOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            growth: config.growth,
            changepoint_prior_scale: config.changepoint_prior_scale,
            seasonality_prior_scale: config.seasonality_prior_scale,
            holidays_prior_scale: config.holidays_prior_scale,
            seasonality_mode: config.seasonality_mode,
            yearly_seasonality: config.yearly_seasonality,
            weekly_seasonality: config.weekly_seasonality,
            daily_seasonality: config.daily_seasonality,
            n_changepoints: config.n_changepoints,
            changepoint_range: config.changepoint_range,
            interval_width: DEFAULT_INTERVAL_WIDTH,
        }
    }
}

/// Output of [`ForecastEngine::predict`]: one row per input row, columns by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    ds: Vec<NaiveDateTime>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PredictionTable {
    pub fn new(ds: Vec<NaiveDateTime>) -> Self {
        Self {
            ds,
            columns: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.ds.len());
        self.columns.insert(name.into(), values);
    }

    pub fn ds(&self) -> &[NaiveDateTime] {
        &self.ds
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }
}

pub trait ForecastEngine: Send {
    fn fit(&mut self, history: &Frame) -> Result<(), EngineError>;

    /// History timestamps followed by `periods` future ones.
    fn make_future_frame(&self, periods: usize) -> Result<Frame, EngineError>;

    fn predict(&self, frame: &Frame) -> Result<PredictionTable, EngineError>;
}

pub trait EngineFactory: Send + Sync {
    fn create(&self, options: EngineOptions) -> Box<dyn ForecastEngine>;
}

/// Factory for the in-crate [`AdditiveModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Builtin;

impl EngineFactory for Builtin {
    fn create(&self, options: EngineOptions) -> Box<dyn ForecastEngine> {
        Box::new(AdditiveModel::new(options))
    }
}
