use super::AppState;
use crate::params::ModelParameters;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/parameters/default", get(default_parameters))
}

/// JSON schema of the model parameters, defaults included.
async fn default_parameters() -> Json<Value> {
    Json(ModelParameters::json_schema())
}
