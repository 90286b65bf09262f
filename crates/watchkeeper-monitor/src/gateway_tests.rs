use super::*;
use crate::alerts::AlertSeverity;
use chrono::Utc;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

fn alert() -> Alert {
    Alert::new(
        "High CPU Usage",
        "CPU usage is 95.0% (threshold 90.0%)",
        AlertSeverity::Warning,
        Utc::now(),
    )
}

fn channel(uri: &str) -> GatewayChannel {
    GatewayChannel::new(uri, "secret-token", Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_send_success() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/alert"))
        .and(matchers::header("authorization", "Bearer secret-token"))
        .and(matchers::body_json(serde_json::json!({
            "title": "High CPU Usage",
            "message": "CPU usage is 95.0% (threshold 90.0%)"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"sent"}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    channel(&mock_server.uri()).send(&alert()).await.unwrap();
}

#[tokio::test]
async fn test_any_2xx_is_success() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/alert"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    channel(&mock_server.uri()).send(&alert()).await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_failure_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/alert"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = channel(&mock_server.uri()).send(&alert()).await.unwrap_err();
    match err {
        MonitorError::GatewayStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("Expected GatewayStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"detail":"Invalid token"}"#))
        .mount(&mock_server)
        .await;

    let err = channel(&mock_server.uri()).send(&alert()).await.unwrap_err();
    assert!(matches!(err, MonitorError::GatewayStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_timeout_is_delivery_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let channel = GatewayChannel::new(&mock_server.uri(), "t", Duration::from_millis(300)).unwrap();
    let err = channel.send(&alert()).await.unwrap_err();
    assert!(matches!(err, MonitorError::AlertDelivery(_)));
}

#[tokio::test]
async fn test_host_appended_to_message() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::body_json(serde_json::json!({
            "title": "High CPU Usage",
            "message": "CPU usage is 95.0% (threshold 90.0%)\n\nHost: pi-01"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    channel(&mock_server.uri())
        .send(&alert().with_source("pi-01"))
        .await
        .unwrap();
}

#[test]
fn test_endpoint_joins_path() {
    let ch = GatewayChannel::new("http://127.0.0.1:8001/", "t", Duration::from_secs(1)).unwrap();
    assert_eq!(ch.endpoint(), "http://127.0.0.1:8001/alert");
    assert_eq!(ch.name(), "gateway");
}

#[test]
fn test_from_config_requires_token() {
    let config = GatewayConfig {
        url: "http://127.0.0.1:8001".to_string(),
        token: None,
        token_file: None,
        timeout_secs: 10,
    };
    assert!(matches!(
        GatewayChannel::from_config(&config),
        Err(MonitorError::Config(_))
    ));

    let config = GatewayConfig {
        token: Some("abc".to_string()),
        ..config
    };
    assert!(GatewayChannel::from_config(&config).is_ok());
}
