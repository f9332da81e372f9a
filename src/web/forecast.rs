use super::AppState;
use crate::errors::Error;
use crate::forecast;
use crate::logging::*;
use crate::types::{ForecastRequest, ForecastResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/forecast/", post(create_forecast))
        .route("/forecast", post(create_forecast))
}

async fn create_forecast(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastResponse>> {
    let log = DEFAULT.new(o!("function" => "web::create_forecast"));

    let Json(request) = body.map_err(|rejection| Error::validation(rejection.body_text()))?;
    debug!(log, "request";
        "observations" => request.data.values.len(),
        "periods" => request.periods,
    );

    match forecast::run_blocking(state.engine.clone(), request, state.timeout).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            info!(log, "forecast failed"; "kind" => err.kind(), "reason" => %err);
            Err(err)
        }
    }
}
