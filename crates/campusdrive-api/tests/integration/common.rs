//! Shared test helpers for API integration tests
//!
//! Provides wiremock-based client construction and a deterministic stub
//! signer so tests can assert on the Authorization header.

use std::sync::Arc;

use campusdrive_api::ApiClient;
use campusdrive_core::config::ApiConfig;
use campusdrive_core::ports::{ISigner, SignError};

/// Token every stub-signed request carries
pub const STUB_TOKEN: &str = "stub-jwt-token";

/// Signer that returns a fixed token; the mock server never verifies it.
pub struct StubSigner;

impl ISigner for StubSigner {
    fn sign(&self, _payload: &serde_json::Value) -> Result<String, SignError> {
        Ok(STUB_TOKEN.to_string())
    }
}

/// Signer that pretends the key was never initialised.
pub struct NotReadySigner;

impl ISigner for NotReadySigner {
    fn sign(&self, _payload: &serde_json::Value) -> Result<String, SignError> {
        Err(SignError::NotReady)
    }
}

/// Builds a client against the given server URI with the stub signer.
pub fn client_for_uri(uri: &str) -> ApiClient {
    client_with_signer(uri, Arc::new(StubSigner))
}

/// Builds a client with a custom signer.
pub fn client_with_signer(uri: &str, signer: Arc<dyn ISigner>) -> ApiClient {
    let config = ApiConfig {
        base_url: uri.to_string(),
        request_timeout: 5,
        upload_timeout: 10,
    };
    ApiClient::new(&config, signer).unwrap()
}

/// A sample inventory response body for `project/{id}/info`.
pub fn inventory_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "files": [
            {"path": "a.txt", "type": "file", "version": 1, "permissions": "rw"},
            {"path": "lib", "type": "dir", "version": 1, "permissions": "r"},
            {"path": "lib/util.c", "type": "file", "version": 3, "permissions": "r"}
        ]
    })
}
