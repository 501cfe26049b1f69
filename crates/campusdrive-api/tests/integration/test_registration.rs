//! Tests for the app-level endpoints: access check, registration, token

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campusdrive_core::ports::{ClientRegistration, IProjectApi};

use crate::common::{client_for_uri, STUB_TOKEN};

#[tokio::test]
async fn test_check_access() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app/checkAccess"))
        .and(header("Authorization", format!("Bearer {STUB_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok"
        })))
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let access = client.check_access().await.unwrap();
    assert_eq!(access.status, "ok");
}

#[tokio::test]
async fn test_register_client() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/app/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "clientId": "client-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let registered = client
        .register_client(&ClientRegistration {
            os: "linux".to_string(),
            name: "laptop".to_string(),
            version: "0.4.0".to_string(),
            token: "one-time".to_string(),
            permissions: vec!["projects".to_string()],
        })
        .await
        .unwrap();

    assert_eq!(registered.client_id, "client-42");
}

#[tokio::test]
async fn test_fetch_client_token_is_unsigned() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app/clientId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "one-time"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let token = client.fetch_client_token().await.unwrap();
    assert_eq!(token.token, "one-time");

    // No Authorization header on the registration bootstrap endpoint.
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("Authorization").is_none());
}
