use crate::params::ModelParameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PERIODS: i64 = 30;

/// Observations as parallel arrays; `dates[i]` is the timestamp of `values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesData {
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub data: TimeSeriesData,
    /// Number of periods to forecast
    #[serde(default = "default_periods")]
    pub periods: i64,
    /// Custom model parameters; defaults apply when absent
    #[serde(default)]
    pub model_parameters: Option<ModelParameters>,
    /// Whether to return trend and seasonal components
    #[serde(default)]
    pub return_components: bool,
}

fn default_periods() -> i64 {
    DEFAULT_PERIODS
}

impl ForecastRequest {
    pub fn new(dates: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            data: TimeSeriesData { dates, values },
            periods: DEFAULT_PERIODS,
            model_parameters: None,
            return_components: false,
        }
    }

    pub fn with_periods(mut self, periods: i64) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_parameters(mut self, params: ModelParameters) -> Self {
        self.model_parameters = Some(params);
        self
    }

    pub fn with_components(mut self, return_components: bool) -> Self {
        self.return_components = return_components;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast_dates: Vec<String>,
    pub forecast_values: Vec<f64>,
    pub forecast_lower_bound: Vec<f64>,
    pub forecast_upper_bound: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, Vec<f64>>>,
}
