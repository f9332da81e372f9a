
use crate::config;
use crate::engine::{
    COMPONENTS, EngineFactory, EngineOptions, PredictionTable, YHAT, YHAT_LOWER, YHAT_UPPER,
};
use crate::errors::Error;
use crate::frame::{Frame, format_dates, to_frame, trailing};
use crate::logging::*;
use crate::params::{Growth, ModelConfig};
use crate::types::{ForecastRequest, ForecastResponse, TimeSeriesData};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

type Result<T> = std::result::Result<T, Error>;

/// A request whose fields have all been validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastJob {
    pub data: TimeSeriesData,
    pub periods: usize,
    pub config: ModelConfig,
    pub return_components: bool,
}

impl TryFrom<ForecastRequest> for ForecastJob {
    type Error = Error;

    fn try_from(request: ForecastRequest) -> Result<Self> {
        let periods = usize::try_from(request.periods)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| {
                Error::validation(format!(
                    "periods must be greater than 0, got {}",
                    request.periods
                ))
            })?;
        let max_periods = config::max_periods();
        if periods > max_periods {
            return Err(Error::validation(format!(
                "periods must be less than or equal to {max_periods}, got {periods}"
            )));
        }
        let config = match request.model_parameters {
            Some(params) => ModelConfig::try_from(params)?,
            None => ModelConfig::default(),
        };
        Ok(Self {
            data: request.data,
            periods,
            config,
            return_components: request.return_components,
        })
    }
}

fn attach_capacity(frame: Frame, growth: &Growth) -> Frame {
    match growth.capacity() {
        Some(capacity) => frame.with_capacity(capacity),
        None => frame,
    }
}

fn column<'a>(table: &'a PredictionTable, name: &str) -> Result<&'a [f64]> {
    table
        .column(name)
        .ok_or_else(|| Error::Engine(format!("prediction has no {name:?} column")))
}

/// Fits a fresh engine on the job's history and returns the last
/// `periods` predicted rows.
pub fn run<F>(factory: &F, job: ForecastJob) -> Result<ForecastResponse>
where
    F: EngineFactory + ?Sized,
{
    let log = DEFAULT.new(o!(
        "function" => "forecast::run",
        "observations" => job.data.values.len(),
        "periods" => job.periods,
        "growth" => job.config.growth.name(),
    ));
    info!(log, "start");

    let history = attach_capacity(to_frame(&job.data)?, &job.config.growth);

    let mut engine = factory.create(EngineOptions::from(&job.config));
    engine.fit(&history)?;
    let future = attach_capacity(engine.make_future_frame(job.periods)?, &job.config.growth);
    let table = engine.predict(&future)?;
    debug!(log, "predicted"; "rows" => table.len());

    let horizon = job.periods;
    let ds = trailing(table.ds(), horizon)?;
    let components = if job.return_components {
        let mut map = BTreeMap::new();
        for name in COMPONENTS {
            if let Some(values) = table.column(name) {
                map.insert(name.to_string(), trailing(values, horizon)?.to_vec());
            }
        }
        Some(map)
    } else {
        None
    };

    let response = ForecastResponse {
        forecast_dates: format_dates(ds),
        forecast_values: trailing(column(&table, YHAT)?, horizon)?.to_vec(),
        forecast_lower_bound: trailing(column(&table, YHAT_LOWER)?, horizon)?.to_vec(),
        forecast_upper_bound: trailing(column(&table, YHAT_UPPER)?, horizon)?.to_vec(),
        components,
    };
    info!(log, "finished";
        "first" => response.forecast_dates.first(),
        "last" => response.forecast_dates.last(),
    );
    Ok(response)
}

/// Validates `request` and runs it.
pub fn execute<F>(factory: &F, request: ForecastRequest) -> Result<ForecastResponse>
where
    F: EngineFactory + ?Sized,
{
    run(factory, ForecastJob::try_from(request)?)
}

/// Runs [`execute`] on the blocking pool, giving up after `timeout`.
///
/// A timed-out computation is not cancelled; its result is dropped when it
/// eventually finishes.
pub async fn run_blocking(
    factory: Arc<dyn EngineFactory>,
    request: ForecastRequest,
    timeout: Duration,
) -> Result<ForecastResponse> {
    let task = tokio::task::spawn_blocking(move || execute(factory.as_ref(), request));
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined?,
        Err(_) => {
            let log = DEFAULT.new(o!("function" => "forecast::run_blocking"));
            warn!(log, "timed out"; "timeout" => ?timeout);
            Err(Error::Timeout(timeout))
        }
    }
}
