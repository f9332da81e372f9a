//! Remote-procedure counterpart of `POST /forecast/`.
//!
//! Requests and responses travel as length-delimited JSON frames over TCP.
//! The procedure is not wired to the engine yet and answers every call with
//! the same placeholder forecast.

#[cfg(test)]
mod tests;

mod service;

pub use service::ForecastServiceImpl;

use crate::logging::*;
use crate::types::{ForecastRequest, ForecastResponse};
use futures_util::StreamExt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tarpc::serde_transport::tcp;
use tarpc::server::{self, Channel};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tokio_serde::formats::Json;

pub const DEFAULT_WORKERS: usize = 10;

/// Largest accepted request frame, in bytes.
pub const MAX_FRAME_LENGTH: usize = 1 << 20;

#[tarpc::service]
pub trait ForecastService {
    /// Forecast a series; same payloads as the HTTP endpoint.
    async fn create_forecast(request: ForecastRequest) -> ForecastResponse;
}

pub struct RpcServer {
    addr: SocketAddr,
    workers: usize,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, workers: usize) -> Self {
        Self {
            addr,
            workers: workers.max(1),
        }
    }

    /// Binds the listener and starts accepting connections.
    ///
    /// Calls from every connection share one pool of `workers` permits.
    pub async fn start(self) -> io::Result<RpcHandle> {
        let log = DEFAULT.new(o!(
            "function" => "RpcServer::start",
            "workers" => self.workers,
        ));

        let mut listener = tcp::listen(self.addr, Json::default).await?;
        listener.config_mut().max_frame_length(MAX_FRAME_LENGTH);
        let local_addr = listener.local_addr();
        info!(log, "listening"; "addr" => %local_addr);

        let permits = Arc::new(Semaphore::new(self.workers));
        let (shutdown, stopped) = watch::channel(false);
        let service = ForecastServiceImpl;

        let connections = stopped.clone();
        let accept = listener
            .filter_map(|r| async move { r.ok() })
            .map(server::BaseChannel::with_defaults)
            .for_each(move |channel| {
                let permits = permits.clone();
                let service = service.clone();
                let mut stopped = connections.clone();
                async move {
                    let requests = channel.execute(service.serve()).for_each(move |response| {
                        let permits = permits.clone();
                        async move {
                            if let Ok(permit) = permits.acquire_owned().await {
                                tokio::spawn(async move {
                                    response.await;
                                    drop(permit);
                                });
                            }
                        }
                    });
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = requests => {}
                            _ = stopped.changed() => {}
                        }
                    });
                }
            });

        let mut stopped = stopped;
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = accept => {}
                _ = stopped.changed() => {}
            }
            info!(log, "stopped");
        });

        Ok(RpcHandle {
            local_addr,
            shutdown,
            task,
        })
    }
}

/// A running [`RpcServer`].
pub struct RpcHandle {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RpcHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and drops the open ones.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
