use httpmock::prelude::*;
use seat_planner::app::{health_url, probe_health};
use seat_planner::utils::error::{ErrorCategory, PlannerError};
use seat_planner::{run_server, AppState};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_probe_accepts_ok_response() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/_stcore/health");
            then.status(200).body("ok");
        })
        .await;

    let body = probe_health(&server.url("/_stcore/health"), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(body, "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_fails_on_error_status() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/_stcore/health");
            then.status(503).body("starting");
        })
        .await;

    let err = probe_health(&server.url("/_stcore/health"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::HttpError(_)));
    assert_eq!(err.category(), ErrorCategory::Network);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_fails_when_nothing_listens() {
    // 先綁定再釋放，取得一個沒有人監聽的埠
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let result = probe_health(&health_url("127.0.0.1", port), TIMEOUT).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_probe_against_running_server() {
    let handle = run_server("127.0.0.1:0".parse().unwrap(), AppState::default())
        .await
        .unwrap();
    let url = health_url("0.0.0.0", handle.local_addr().port());

    assert_eq!(probe_health(&url, TIMEOUT).await.unwrap(), "ok");

    handle.stop().await;
    assert!(probe_health(&url, TIMEOUT).await.is_err());
}
