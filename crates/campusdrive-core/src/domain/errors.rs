//! Domain error types
//!
//! This module defines the two error layers of the core:
//! - [`DomainError`] for validation failures at newtype construction time
//! - [`SyncError`] for failures of a synchronisation run, persisted as part
//!   of a project's sync state

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::changes::ConflictingChange;

/// Errors that can occur when constructing or validating domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid relative path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid content hash format (expected lowercase hex SHA-256)
    #[error("Invalid hash format: {0}")]
    InvalidHash(String),

    /// Invalid project identifier
    #[error("Invalid project id: {0}")]
    InvalidId(String),

    /// A path segment that cannot appear in a directory tree
    #[error("Invalid path segment: {0}")]
    InvalidSegment(String),
}

/// The reason a synchronisation run failed
///
/// Every variant carries enough context to explain the failure to the user.
/// The enum is serialisable because a failed run's error is persisted on the
/// project record (`SyncState::Failed`) by the host shell.
///
/// A run aborts on the first error and performs no metadata-store write, so
/// the persisted baseline always reflects the last successful sync.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncError {
    /// Both sides modified overlapping paths since the baseline
    #[error("conflicting changes on {} path(s)", .conflicts.len())]
    ConflictingChanges {
        /// The overlapping paths with the change observed on each side
        conflicts: Vec<ConflictingChange>,
    },

    /// Attempt to mutate a path that is read-only on the remote
    #[error("read-only path changed: {path} ({reason})")]
    ReadOnlyFilesChanged {
        /// The offending path (project-relative)
        path: String,
        /// Which rule was violated (the file itself, or an ancestor)
        reason: String,
    },

    /// A proposed file name fails platform validity rules
    #[error("invalid filename: {name}")]
    InvalidFilename {
        /// The rejected name
        name: String,
    },

    /// An I/O error, unexpected absence, or malformed ancestor
    #[error("filesystem corrupted at {path}: {reason}")]
    FileSystemCorrupted {
        /// The path at which the problem was observed
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The `projectDir` setting is not configured
    #[error("project directory is not configured")]
    ProjectDirMissing,

    /// Transport failure or server-side error
    #[error("network error: {reason}")]
    NetworkError {
        /// Underlying cause
        reason: String,
    },
}

impl SyncError {
    /// Short machine-readable name of the variant, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SyncError::ConflictingChanges { .. } => "conflictingChanges",
            SyncError::ReadOnlyFilesChanged { .. } => "readOnlyFilesChanged",
            SyncError::InvalidFilename { .. } => "invalidFilename",
            SyncError::FileSystemCorrupted { .. } => "fileSystemCorrupted",
            SyncError::ProjectDirMissing => "projectDirMissing",
            SyncError::NetworkError { .. } => "networkError",
        }
    }

    /// Whether the user can plausibly fix the situation by retrying
    ///
    /// Network and filesystem problems are often transient; the remaining
    /// variants require user action (resolving a conflict, renaming a file)
    /// before another run can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::NetworkError { .. } | SyncError::FileSystemCorrupted { .. }
        )
    }
}
