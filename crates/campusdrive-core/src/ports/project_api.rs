//! Course-server API port (driven/secondary port)
//!
//! This module defines the interface for all interactions with the course
//! server. The concrete implementation builds JWT-signed HTTP requests; the
//! trait stays transport-agnostic so tests can substitute an in-memory
//! server.
//!
//! ## Design Notes
//!
//! - Unlike the storage ports, this port has a *typed* error enum:
//!   the orchestrator branches on the transport/HTTP classification to
//!   produce user-facing errors, so `anyhow` would be too coarse here.
//! - The DTOs mirror the wire format; use cases map them onto domain
//!   entities where needed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::files::RemoteFileInfo;
use crate::domain::newtypes::{FileHash, ProjectId, RelativePath};

// ============================================================================
// ApiError
// ============================================================================

/// Classification of a failed API request
#[derive(Debug, Error)]
pub enum ApiError {
    /// The signing capability was not initialised before use.
    ///
    /// This is a programming error in the host wiring, not a runtime
    /// condition; callers treat it as fatal.
    #[error("API signer is not initialised")]
    NotReady,

    /// The request never produced an HTTP response (DNS, connect, timeout)
    #[error("network unreachable: {reason}")]
    NoNetwork {
        /// Underlying transport error
        reason: String,
    },

    /// The server rejected the request (4xx), or the response body could
    /// not be decoded against the expected schema
    #[error("client error (HTTP {status}): {message}")]
    ClientError {
        /// HTTP status code (0 for decode failures)
        status: u16,
        /// Server-provided or decoder-provided message
        message: String,
    },

    /// The server failed to process the request (5xx)
    #[error("server error (HTTP {status}): {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Server-provided message
        message: String,
    },
}

// ============================================================================
// Wire DTOs
// ============================================================================

/// Response of `GET project/{id}/info` and `POST project/{id}/files`:
/// the authoritative per-project inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInventory {
    /// The project the inventory belongs to
    #[serde(rename = "_id")]
    pub id: ProjectId,
    /// Every entry the server knows about, files and directories
    pub files: Vec<RemoteFileInfo>,
}

/// A compressed archive of local files, ready for upload
#[derive(Debug, Clone)]
pub struct ProjectArchive {
    /// The brotli-compressed tar bytes
    pub bytes: Vec<u8>,
    /// Digest of `bytes`, echoed in the signed request payload so the
    /// server can verify integrity
    pub content_hash: FileHash,
}

/// Response of `GET app/checkAccess`
#[derive(Debug, Clone, Deserialize)]
pub struct AccessStatus {
    /// Server-reported access status
    pub status: String,
}

/// Request body of `POST app/register`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    /// Operating system identifier
    pub os: String,
    /// Host name shown in the user's device list
    pub name: String,
    /// Client version
    pub version: String,
    /// One-time registration token obtained from `app/clientId`
    pub token: String,
    /// Requested permission scopes
    pub permissions: Vec<String>,
}

/// Response of `POST app/register`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredClient {
    /// The server-assigned client identifier
    pub client_id: String,
}

/// Response of `GET app/clientId` (the only unsigned endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct ClientToken {
    /// One-time token to present during registration
    pub token: String,
}

// ============================================================================
// IProjectApi trait
// ============================================================================

/// Port trait for signed course-server operations
///
/// Every method except [`IProjectApi::fetch_client_token`] attaches a JWT
/// signed with the client's private key. Implementations must not retry
/// failed requests; the caller decides whether a retry is appropriate.
#[async_trait::async_trait]
pub trait IProjectApi: Send + Sync {
    /// Fetches the authoritative inventory for a project
    async fn project_info(&self, id: &ProjectId) -> Result<ProjectInventory, ApiError>;

    /// Downloads a single file's content as text
    ///
    /// The path travels in the signed JWT payload, not the URL.
    async fn download_file(
        &self,
        id: &ProjectId,
        path: &RelativePath,
    ) -> Result<String, ApiError>;

    /// Uploads changed files and/or requests server-side removals
    ///
    /// `archive` carries the brotli-compressed tar of added/updated files
    /// (absent when only removals are requested). The archive hash and the
    /// removal list travel in the signed JWT payload.
    ///
    /// # Returns
    /// The inventory as updated by the server.
    async fn upload_files(
        &self,
        id: &ProjectId,
        archive: Option<&ProjectArchive>,
        remove_files: &[RelativePath],
    ) -> Result<ProjectInventory, ApiError>;

    /// Verifies that this client's key is still accepted by the server
    async fn check_access(&self) -> Result<AccessStatus, ApiError>;

    /// Registers this client installation with the server
    async fn register_client(
        &self,
        registration: &ClientRegistration,
    ) -> Result<RegisteredClient, ApiError>;

    /// Fetches a one-time registration token (unsigned)
    async fn fetch_client_token(&self) -> Result<ClientToken, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::files::{EntryKind, FilePermissions};

    #[test]
    fn test_inventory_deserialization() {
        let json = r#"{
            "_id": "p1",
            "files": [
                {"path": "a.txt", "type": "file", "version": 1, "permissions": "rw"},
                {"path": "lib", "type": "dir", "version": 1, "permissions": "r"}
            ]
        }"#;

        let inventory: ProjectInventory = serde_json::from_str(json).unwrap();
        assert_eq!(inventory.id.as_str(), "p1");
        assert_eq!(inventory.files.len(), 2);
        assert_eq!(inventory.files[0].kind, EntryKind::File);
        assert_eq!(inventory.files[1].permissions, FilePermissions::ReadOnly);
    }

    #[test]
    fn test_registration_wire_format() {
        let registration = ClientRegistration {
            os: "linux".to_string(),
            name: "laptop".to_string(),
            version: "0.4.0".to_string(),
            token: "one-time".to_string(),
            permissions: vec!["projects".to_string()],
        };

        let json = serde_json::to_value(&registration).unwrap();
        assert_eq!(json["os"], "linux");
        assert_eq!(json["permissions"][0], "projects");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::ClientError {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "client error (HTTP 403): forbidden");

        assert_eq!(
            ApiError::NotReady.to_string(),
            "API signer is not initialised"
        );
    }
}
