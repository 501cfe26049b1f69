//! Course-server API client
//!
//! Provides a typed HTTP client implementing the [`IProjectApi`] port.
//! Every request except `app/clientId` carries a JWT in the Authorization
//! header whose payload holds the request parameters; bodies are reserved
//! for binary archive uploads.
//!
//! The client performs no retries. Failures are classified into
//! [`ApiError`] and the caller decides what to do with them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use campusdrive_core::config::ApiConfig;
use campusdrive_core::domain::{ProjectId, RelativePath};
use campusdrive_core::ports::{
    AccessStatus, ApiError, ClientRegistration, ClientToken, IProjectApi, ISigner,
    ProjectArchive, ProjectInventory, RegisteredClient, SignError,
};

/// MIME type of the upload archive body
const ARCHIVE_CONTENT_TYPE: &str = "application/x-tar";

/// Content encoding of the upload archive body
const ARCHIVE_CONTENT_ENCODING: &str = "br";

/// HTTP client for the course-server API
///
/// Wraps `reqwest::Client` with base-URL construction, request signing and
/// error classification. JSON requests share one bounded timeout; archive
/// uploads get a longer one because payloads can be large.
pub struct ApiClient {
    /// The underlying HTTP client (carries the JSON request timeout)
    client: Client,
    /// Base URL without a trailing slash
    base_url: String,
    /// The injected signing capability
    signer: Arc<dyn ISigner>,
    /// Per-request timeout override for archive uploads
    upload_timeout: Duration,
}

impl ApiClient {
    /// Creates a client from configuration and a signing capability
    pub fn new(config: &ApiConfig, signer: Arc<dyn ISigner>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer,
            upload_timeout: Duration::from_secs(config.upload_timeout),
        })
    }

    /// Returns the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a signed request builder for the given method and path
    ///
    /// The JWT payload is exactly `payload`; the server rejects tokens it
    /// cannot verify against the registered public key.
    fn signed_request(
        &self,
        method: Method,
        path: &str,
        payload: &Value,
    ) -> Result<RequestBuilder, ApiError> {
        let token = self.signer.sign(payload).map_err(|e| match e {
            SignError::NotReady => ApiError::NotReady,
            SignError::Failed(message) => ApiError::ClientError {
                status: 0,
                message: format!("request signing failed: {message}"),
            },
        })?;

        let url = format!("{}/{}", self.base_url, path);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    /// Sends a request, classifying transport failures and error statuses
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_else(|_| String::new());
        if status.is_server_error() {
            Err(ApiError::ServerError {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(ApiError::ClientError {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Decodes a JSON response body against the expected schema
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response.json::<T>().await.map_err(|e| ApiError::ClientError {
            status: 0,
            message: format!("failed to decode response: {e}"),
        })
    }
}

/// A request that never produced an HTTP response
fn transport_error(e: reqwest::Error) -> ApiError {
    ApiError::NoNetwork {
        reason: e.to_string(),
    }
}

#[async_trait::async_trait]
impl IProjectApi for ApiClient {
    async fn project_info(&self, id: &ProjectId) -> Result<ProjectInventory, ApiError> {
        debug!(project = %id, "fetching project inventory");

        let request =
            self.signed_request(Method::GET, &format!("project/{id}/info"), &json!({}))?;
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn download_file(
        &self,
        id: &ProjectId,
        path: &RelativePath,
    ) -> Result<String, ApiError> {
        debug!(project = %id, path = %path, "downloading file");

        let payload = json!({ "path": path.as_str() });
        let request =
            self.signed_request(Method::GET, &format!("project/{id}/file"), &payload)?;
        let response = self.send(request).await?;

        response.text().await.map_err(transport_error)
    }

    async fn upload_files(
        &self,
        id: &ProjectId,
        archive: Option<&ProjectArchive>,
        remove_files: &[RelativePath],
    ) -> Result<ProjectInventory, ApiError> {
        debug!(
            project = %id,
            has_archive = archive.is_some(),
            removals = remove_files.len(),
            "uploading project changes"
        );

        let removals: Vec<&str> = remove_files.iter().map(|p| p.as_str()).collect();
        let payload = match archive {
            Some(archive) => json!({
                "tarHash": archive.content_hash.as_str(),
                "removeFiles": removals,
            }),
            None => json!({ "removeFiles": removals }),
        };

        let mut request = self
            .signed_request(Method::POST, &format!("project/{id}/files"), &payload)?
            .timeout(self.upload_timeout);

        if let Some(archive) = archive {
            request = request
                .header(CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
                .header(CONTENT_ENCODING, ARCHIVE_CONTENT_ENCODING)
                .body(archive.bytes.clone());
        }

        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn check_access(&self) -> Result<AccessStatus, ApiError> {
        let request = self.signed_request(Method::GET, "app/checkAccess", &json!({}))?;
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn register_client(
        &self,
        registration: &ClientRegistration,
    ) -> Result<RegisteredClient, ApiError> {
        debug!(name = %registration.name, "registering client");

        let payload = serde_json::to_value(registration).map_err(|e| ApiError::ClientError {
            status: 0,
            message: format!("failed to encode registration: {e}"),
        })?;
        let request = self.signed_request(Method::POST, "app/register", &payload)?;
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn fetch_client_token(&self) -> Result<ClientToken, ApiError> {
        // The only unsigned endpoint: the client has no key yet at this
        // point of the registration handshake.
        let url = format!("{}/app/clientId", self.base_url);
        let request = self.client.get(url);
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}
