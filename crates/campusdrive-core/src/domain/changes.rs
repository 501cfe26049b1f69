//! Change records produced by diffing a baseline against an inventory
//!
//! A file's identity is its path; a move shows up as removal of the old path
//! plus addition of the new one. Remote changes are detected by the server's
//! version counter, local changes by content hash, which is why the two kinds
//! carry different payloads.

use serde::{Deserialize, Serialize};

use super::newtypes::RelativePath;

// ============================================================================
// Change kinds
// ============================================================================

/// How a path changed on the remote since the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum RemoteChangeKind {
    /// Present in both with an unchanged version
    NoChange,
    /// Present in the latest inventory only
    Added {
        /// Version the entry was created at
        version: u64,
    },
    /// Present in both with a newer version
    Updated {
        /// The new version
        version: u64,
    },
    /// Present in the baseline only
    Removed,
}

/// How a path changed locally since the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum LocalChangeKind {
    /// Present in both with an unchanged hash
    NoChange,
    /// Present on disk only
    Added,
    /// Present in both with a different hash
    Updated,
    /// Present in the baseline only
    Removed,
}

// ============================================================================
// Change records
// ============================================================================

/// A remote-side change at one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileChange {
    /// Project-relative POSIX path
    pub path: RelativePath,
    /// What happened on the remote
    #[serde(flatten)]
    pub change: RemoteChangeKind,
}

/// A local-side change at one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileChange {
    /// Project-relative POSIX path
    pub path: RelativePath,
    /// What happened locally
    #[serde(flatten)]
    pub change: LocalChangeKind,
}

/// A path that changed on both sides since the baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingChange {
    /// The overlapping path
    pub path: RelativePath,
    /// The change observed locally
    pub change_local: LocalChangeKind,
    /// The change observed on the remote
    pub change_remote: RemoteChangeKind,
}

// ============================================================================
// Changes summary
// ============================================================================

/// Summary of pending diffs since the baseline, persisted on the project
///
/// A fresh sync leaves this at `Unknown`; a later background comparison may
/// replace it with the concrete pending change sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Changes {
    /// Not computed since the last sync
    Unknown,
    /// Concrete pending diffs on each side
    Pending {
        /// Local changes since the baseline (possibly empty)
        local: Vec<LocalFileChange>,
        /// Remote changes since the baseline (possibly empty)
        remote: Vec<RemoteFileChange>,
    },
}

impl Changes {
    /// Returns true when no pending change is known on either side
    pub fn is_clean(&self) -> bool {
        match self {
            Changes::Unknown => false,
            Changes::Pending { local, remote } => local.is_empty() && remote.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> RelativePath {
        RelativePath::new(s).unwrap()
    }

    #[test]
    fn test_remote_change_wire_format() {
        let change = RemoteFileChange {
            path: path("a.txt"),
            change: RemoteChangeKind::Updated { version: 2 },
        };

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["path"], "a.txt");
        assert_eq!(json["change"], "updated");
        assert_eq!(json["version"], 2);
    }

    #[test]
    fn test_local_change_wire_format() {
        let change = LocalFileChange {
            path: path("b.txt"),
            change: LocalChangeKind::Removed,
        };

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["path"], "b.txt");
        assert_eq!(json["change"], "removed");
    }

    #[test]
    fn test_conflicting_change_roundtrip() {
        let conflict = ConflictingChange {
            path: path("a.txt"),
            change_local: LocalChangeKind::Updated,
            change_remote: RemoteChangeKind::Updated { version: 2 },
        };

        let json = serde_json::to_string(&conflict).unwrap();
        let back: ConflictingChange = serde_json::from_str(&json).unwrap();
        assert_eq!(conflict, back);
    }

    #[test]
    fn test_changes_is_clean() {
        assert!(!Changes::Unknown.is_clean());
        assert!(Changes::Pending {
            local: vec![],
            remote: vec![],
        }
        .is_clean());
        assert!(!Changes::Pending {
            local: vec![LocalFileChange {
                path: path("a.txt"),
                change: LocalChangeKind::Added,
            }],
            remote: vec![],
        }
        .is_clean());
    }
}
