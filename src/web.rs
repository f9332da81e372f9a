
mod basic;
mod forecast;
mod parameters;

use crate::engine::EngineFactory;
use crate::errors::Error;
use crate::logging::*;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub engine: Arc<dyn EngineFactory>,
    pub timeout: Duration,
}

impl AppState {
    pub fn new(engine: Arc<dyn EngineFactory>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    add_routes(
        Router::new(),
        &[basic::add_route, forecast::add_route, parameters::add_route],
    )
    .with_state(Arc::new(state))
    .layer(cors)
}

pub async fn run(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let log = DEFAULT.new(o!("function" => "web::run"));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(log, "listening"; "addr" => %listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!(log, "stopped");
    Ok(())
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Input(_) | Error::Engine(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
