#![deny(warnings)]

use forecaster::engine::Builtin;
use forecaster::logging::*;
use forecaster::rpc::RpcServer;
use forecaster::{config, web};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let log = DEFAULT.new(o!("function" => "main"));
    info!(log, "Starting up";
        "http_addr" => %config::http_addr(),
        "rpc_addr" => %config::rpc_addr(),
    );

    let rpc = match RpcServer::new(config::rpc_addr(), config::rpc_workers())
        .start()
        .await
    {
        Ok(handle) => handle,
        Err(err) => {
            crit!(log, "failed to start rpc server"; "error" => %err);
            std::process::exit(1);
        }
    };

    let state = web::AppState::new(Arc::new(Builtin), config::forecast_timeout());
    let shutdown = {
        let log = log.clone();
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(log, "failed to listen for ctrl-c"; "error" => %err);
            }
            info!(log, "shutting down");
        }
    };
    if let Err(err) = web::run(config::http_addr(), state, shutdown).await {
        crit!(log, "http server failed"; "error" => %err);
    }

    rpc.stop().await;
    info!(log, "Stopped");
}
