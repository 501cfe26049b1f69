//! The Project entity
//!
//! A project is known in one of two shapes:
//!
//! ```text
//!     ┌──────────┐     first successful sync      ┌──────────┐
//!     │  Remote  │ ─────────────────────────────► │  Local   │
//!     │ (server  │                                │ (has a   │
//!     │  only)   │                                │ baseline)│
//!     └──────────┘                                └──────────┘
//! ```
//!
//! `Remote` projects exist server-side and have never been synced to this
//! machine. The first successful sync promotes a project to `Local`, giving
//! it a baseline file list, a directory below the configured project root,
//! and a sync state. Later syncs only replace `files`, `synced_at` and
//! `sync_state`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::changes::Changes;
use super::errors::{DomainError, SyncError};
use super::files::{FileInfo, FilePermissions};
use super::newtypes::{ProjectId, RelativePath};
use super::paths::escape_segment;

// ============================================================================
// ProjectMetadata
// ============================================================================

/// Server-assigned metadata describing where a project belongs in the
/// course hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    /// Opaque project identifier
    pub project_id: ProjectId,
    /// Semester the course runs in (e.g. "2026S")
    pub semester: String,
    /// Course display name
    pub course_name: String,
    /// Exercise sheet display name
    pub exercise_name: String,
    /// Task display name
    pub task_name: String,
    /// Project-level permission (the per-file permission still governs
    /// individual entries)
    pub permissions: FilePermissions,
    /// Position of the task within its exercise
    pub task_order: u32,
    /// Position of the exercise within the course
    pub exercise_order: u32,
}

impl ProjectMetadata {
    /// The project directory relative to the configured root:
    /// `semester/course/exercise/task`, each segment escaped
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` when a metadata field is empty,
    /// which would produce a degenerate directory name.
    pub fn relative_dir(&self) -> Result<RelativePath, DomainError> {
        let segments = [
            &self.semester,
            &self.course_name,
            &self.exercise_name,
            &self.task_name,
        ];
        let escaped: Vec<String> = segments.iter().map(|s| escape_segment(s)).collect();
        RelativePath::new(escaped.join("/"))
    }
}

// ============================================================================
// SyncState
// ============================================================================

/// Persisted synchronisation state of a local project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SyncState {
    /// The last run succeeded; `changes` summarises diffs observed since
    Synced {
        /// Pending diffs since the baseline (`Unknown` right after a sync)
        changes: Changes,
    },
    /// A run is currently in flight; callers must not start another
    Syncing,
    /// The last run failed
    Failed {
        /// Why the run failed
        error: SyncError,
    },
}

impl SyncState {
    /// State of a freshly synced project
    pub fn fresh() -> Self {
        SyncState::Synced {
            changes: Changes::Unknown,
        }
    }

    /// Returns true while a run is in flight
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncState::Syncing)
    }
}

// ============================================================================
// LocalState
// ============================================================================

/// The local half of a project that has been synced at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    /// Project directory relative to the configured root
    pub base_path: RelativePath,
    /// The baseline: the file list observed right after the last
    /// successful sync
    pub files: Vec<FileInfo>,
    /// When the last successful sync completed
    pub synced_at: DateTime<Utc>,
    /// Current synchronisation state
    pub sync_state: SyncState,
}

// ============================================================================
// Project
// ============================================================================

/// A project as persisted in the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Project {
    /// Known to exist server-side, never synced to this machine
    Remote {
        /// Server-assigned metadata
        metadata: ProjectMetadata,
    },
    /// Synced at least once; carries a baseline
    Local {
        /// Server-assigned metadata
        metadata: ProjectMetadata,
        /// Baseline, directory and sync state
        state: LocalState,
    },
}

impl Project {
    /// The project identifier
    pub fn id(&self) -> &ProjectId {
        &self.metadata().project_id
    }

    /// The server-assigned metadata, regardless of shape
    pub fn metadata(&self) -> &ProjectMetadata {
        match self {
            Project::Remote { metadata } | Project::Local { metadata, .. } => metadata,
        }
    }

    /// The local state, if the project has been synced
    pub fn local_state(&self) -> Option<&LocalState> {
        match self {
            Project::Remote { .. } => None,
            Project::Local { state, .. } => Some(state),
        }
    }

    /// The baseline file list, if the project has been synced
    pub fn baseline(&self) -> Option<&[FileInfo]> {
        self.local_state().map(|s| s.files.as_slice())
    }

    /// Returns true for projects with a baseline
    pub fn is_local(&self) -> bool {
        matches!(self, Project::Local { .. })
    }

    /// The project directory relative to the configured root
    ///
    /// For `Local` projects this is the recorded `base_path`; for `Remote`
    /// projects it is derived from the metadata.
    pub fn relative_dir(&self) -> Result<RelativePath, DomainError> {
        match self {
            Project::Remote { metadata } => metadata.relative_dir(),
            Project::Local { state, .. } => Ok(state.base_path.clone()),
        }
    }
}
