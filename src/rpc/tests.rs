use super::*;
use std::time::Duration;
use tarpc::{client, context};

async fn connect(addr: SocketAddr) -> ForecastServiceClient {
    let transport = tcp::connect(addr, Json::default).await.unwrap();
    ForecastServiceClient::new(client::Config::default(), transport).spawn()
}

fn localhost() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

#[test]
fn test_placeholder_values() {
    let response = service::placeholder();
    assert_eq!(
        response.forecast_dates,
        vec!["2025-01-01", "2025-01-02", "2025-01-03"]
    );
    assert_eq!(response.forecast_values, vec![25.0, 26.0, 27.0]);
    assert_eq!(response.forecast_lower_bound, vec![24.0, 25.0, 26.0]);
    assert_eq!(response.forecast_upper_bound, vec![26.0, 27.0, 28.0]);
    assert!(response.components.is_none());
}

#[tokio::test]
async fn test_round_trip_ignores_input() {
    let handle = RpcServer::new(localhost(), 2).start().await.unwrap();
    assert_ne!(handle.local_addr().port(), 0);

    let client = connect(handle.local_addr()).await;
    let request = ForecastRequest::new(
        vec!["2023-01-01".to_string(), "2023-01-02".to_string()],
        vec![1.0, 2.0],
    )
    .with_periods(5)
    .with_components(true);
    let response = client
        .create_forecast(context::current(), request)
        .await
        .unwrap();
    assert_eq!(response, service::placeholder());

    // invalid input is not examined either
    let response = client
        .create_forecast(context::current(), ForecastRequest::new(vec![], vec![]))
        .await
        .unwrap();
    assert_eq!(response.forecast_values, vec![25.0, 26.0, 27.0]);

    handle.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients_share_pool() {
    let handle = RpcServer::new(localhost(), 1).start().await.unwrap();
    let addr = handle.local_addr();

    let calls = (0..4).map(|_| async move {
        let client = connect(addr).await;
        client
            .create_forecast(
                context::current(),
                ForecastRequest::new(vec!["2023-01-01".to_string()], vec![1.0]),
            )
            .await
            .unwrap()
    });
    for response in futures_util::future::join_all(calls).await {
        assert_eq!(response.forecast_dates.len(), 3);
    }

    handle.stop().await;
}

#[tokio::test]
async fn test_oversized_frame_is_refused() {
    let handle = RpcServer::new(localhost(), 2).start().await.unwrap();
    let client = connect(handle.local_addr()).await;

    let len = MAX_FRAME_LENGTH / 4;
    let request = ForecastRequest::new(vec!["2023-01-01".to_string(); len], vec![1.0; len]);
    let result = tokio::time::timeout(
        Duration::from_secs(15),
        client.create_forecast(context::current(), request),
    )
    .await
    .unwrap();
    assert!(result.is_err());

    // other connections are unaffected
    let client = connect(handle.local_addr()).await;
    let response = client
        .create_forecast(context::current(), ForecastRequest::new(vec![], vec![]))
        .await
        .unwrap();
    assert_eq!(response, service::placeholder());

    handle.stop().await;
}

#[tokio::test]
async fn test_stop_closes_listener() {
    let handle = RpcServer::new(localhost(), DEFAULT_WORKERS).start().await.unwrap();
    let addr = handle.local_addr();
    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .unwrap();

    // the port is free again
    let listener = tokio::net::TcpListener::bind(addr).await;
    assert!(listener.is_ok());
}
