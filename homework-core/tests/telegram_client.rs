//! Integration tests for TelegramClient against a mocked Bot API.

use homework_core::{DeliveryError, MessageTransport, TelegramClient};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123456:test-token";

fn create_test_client(mock_server: &MockServer) -> TelegramClient {
    TelegramClient::new(TOKEN.to_string(), mock_server.uri()).expect("failed to create client")
}

#[tokio::test]
async fn test_send_message_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .and(body_json(json!({"chat_id": "42", "text": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"message_id": 1, "chat": {"id": 42}, "text": "hello"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    client
        .send_message("42", "hello")
        .await
        .expect("send failed");
}

#[tokio::test]
async fn test_send_message_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message text is empty"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.send_message("42", "").await.unwrap_err();

    match err {
        DeliveryError::MalformedContent { description } => {
            assert_eq!(description, "Bad Request: message text is empty");
        }
        other => panic!("expected MalformedContent, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_message_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.send_message("42", "hello").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_send_message_blocked_by_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.send_message("42", "hello").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_send_message_rate_limited_is_other_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{}/sendMessage", TOKEN)))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": {"retry_after": 5}
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.send_message("42", "hello").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Api { status, .. } if status.as_u16() == 429));
}

#[tokio::test]
async fn test_get_me() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/bot{}/getMe", TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "id": 123456,
                "is_bot": true,
                "first_name": "Homework",
                "username": "homework_status_bot"
            }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let me = client.get_me().await.expect("getMe failed");
    assert_eq!(me.id, 123456);
    assert_eq!(me.username.as_deref(), Some("homework_status_bot"));
}

#[tokio::test]
async fn test_transport_error_does_not_leak_token() {
    // Nothing listens on port 1
    let client = TelegramClient::new(TOKEN.to_string(), "http://127.0.0.1:1".to_string())
        .expect("failed to create client");

    let err = client.send_message("42", "hello").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Transport(_)));
    assert!(!err.to_string().contains(TOKEN));
    assert!(!format!("{:?}", err).contains(TOKEN));
}
