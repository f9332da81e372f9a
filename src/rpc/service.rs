use super::ForecastService;
use crate::logging::*;
use crate::types::{ForecastRequest, ForecastResponse};
use tarpc::context;

#[derive(Clone)]
pub struct ForecastServiceImpl;

impl ForecastService for ForecastServiceImpl {
    async fn create_forecast(
        self,
        _: context::Context,
        request: ForecastRequest,
    ) -> ForecastResponse {
        let log = DEFAULT.new(o!("function" => "rpc::create_forecast"));
        info!(log, "received";
            "observations" => request.data.values.len(),
            "periods" => request.periods,
            "return_components" => request.return_components,
        );
        placeholder()
    }
}

pub(super) fn placeholder() -> ForecastResponse {
    ForecastResponse {
        forecast_dates: ["2025-01-01", "2025-01-02", "2025-01-03"]
            .map(String::from)
            .to_vec(),
        forecast_values: vec![25.0, 26.0, 27.0],
        forecast_lower_bound: vec![24.0, 25.0, 26.0],
        forecast_upper_bound: vec![26.0, 27.0, 28.0],
        components: None,
    }
}
