//! Request-signing port (driven/secondary port)
//!
//! The core never touches key material. It receives a ready
//! `sign(payload) -> JWT` capability from the host, injected wherever signed
//! requests are built.

use thiserror::Error;

/// Errors produced by the signing capability
#[derive(Debug, Error)]
pub enum SignError {
    /// The signing key is not available yet.
    ///
    /// Surfaces as [`crate::ports::ApiError::NotReady`]; a correctly wired
    /// host constructs its signer before constructing the API client, so
    /// this indicates a programming error.
    #[error("signing key unavailable")]
    NotReady,

    /// The key was present but signing failed
    #[error("signing failed: {0}")]
    Failed(String),
}

/// Port trait for the JWT-signing capability
///
/// Implementations are cheap to call and thread-safe; signing is a pure
/// CPU operation over in-memory key material.
pub trait ISigner: Send + Sync {
    /// Signs `payload` (an arbitrary JSON object, possibly `{}`) into a
    /// compact JWT
    fn sign(&self, payload: &serde_json::Value) -> Result<String, SignError>;
}
