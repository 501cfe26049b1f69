//! Tests for error classification

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campusdrive_core::domain::ProjectId;
use campusdrive_core::ports::{ApiError, IProjectApi};

use crate::common::{client_for_uri, client_with_signer, NotReadySigner};

fn project_id() -> ProjectId {
    ProjectId::new("p1").unwrap()
}

#[tokio::test]
async fn test_404_is_client_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/project/p1/info"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such project"))
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let err = client.project_info(&project_id()).await.unwrap_err();

    match err {
        ApiError::ClientError { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "no such project");
        }
        other => panic!("expected ClientError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_500_is_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/project/p1/info"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let err = client.project_info(&project_id()).await.unwrap_err();

    assert!(matches!(err, ApiError::ServerError { status: 503, .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_client_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/project/p1/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not json"))
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let err = client.project_info(&project_id()).await.unwrap_err();

    assert!(matches!(err, ApiError::ClientError { status: 0, .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_no_network() {
    // Nothing listens on this port.
    let client = client_for_uri("http://127.0.0.1:9");

    let err = client.project_info(&project_id()).await.unwrap_err();
    assert!(matches!(err, ApiError::NoNetwork { .. }));
}

#[tokio::test]
async fn test_uninitialised_signer_is_not_ready() {
    let server = MockServer::start().await;
    let client = client_with_signer(&server.uri(), Arc::new(NotReadySigner));

    let err = client.project_info(&project_id()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotReady));

    // The request must never have left the client.
    assert!(server.received_requests().await.unwrap().is_empty());
}
