//! File inventory types
//!
//! Three views of the same tree exist during a sync run:
//! - [`FileInfo`]: a baseline entry, persisted after a successful sync
//!   (remote version *and* locally observed content hash)
//! - [`RemoteFileInfo`]: an entry of the authoritative remote inventory
//!   (version and permissions, no hash)
//! - [`LocalFileState`]: an entry observed on the local filesystem
//!   (content hash, no version — the local FS knows nothing about the
//!   server-side version counter or permission model)

use serde::{Deserialize, Serialize};

use super::newtypes::{FileHash, RelativePath};

// ============================================================================
// EntryKind
// ============================================================================

/// Whether an inventory entry is a regular file or a directory
///
/// Only files participate in hashing and content diffing; directories are
/// reconciled by existence alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file with content
    File,
    /// Directory
    Dir,
}

impl EntryKind {
    /// Returns true for regular files
    pub fn is_file(self) -> bool {
        matches!(self, EntryKind::File)
    }
}

// ============================================================================
// FilePermissions
// ============================================================================

/// Server-side permission of an entry
///
/// Permissions are authoritative on the remote; the local file mode is
/// derived from them when a file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilePermissions {
    /// Read-only: the client must never upload changes to this entry
    #[serde(rename = "r")]
    ReadOnly,
    /// Read-write: local modifications may be uploaded
    #[serde(rename = "rw")]
    ReadWrite,
}

impl FilePermissions {
    /// Returns true if local modifications to this entry may be uploaded
    pub fn is_writable(self) -> bool {
        matches!(self, FilePermissions::ReadWrite)
    }

    /// Unix mode bits for a file with this permission
    pub fn file_mode(self) -> u32 {
        match self {
            FilePermissions::ReadOnly => 0o444,
            FilePermissions::ReadWrite => 0o644,
        }
    }

    /// Unix mode bits for a directory with this permission
    ///
    /// Directories always keep the execute bit so they can be traversed.
    pub fn dir_mode(self) -> u32 {
        match self {
            FilePermissions::ReadOnly => 0o555,
            FilePermissions::ReadWrite => 0o755,
        }
    }
}

// ============================================================================
// Inventory entries
// ============================================================================

/// A baseline entry: the state observed immediately after the last
/// successful sync
///
/// `hash` is present exactly for `kind == File`; directories carry no hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Project-relative POSIX path
    pub path: RelativePath,
    /// File or directory
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Server-side version counter at sync time
    pub version: u64,
    /// Content digest at sync time (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<FileHash>,
    /// Server-side permission at sync time
    pub permissions: FilePermissions,
}

/// An entry of the authoritative remote inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileInfo {
    /// Project-relative POSIX path
    pub path: RelativePath,
    /// File or directory
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Server-side version counter
    pub version: u64,
    /// Server-side permission
    pub permissions: FilePermissions,
}

impl RemoteFileInfo {
    /// Combine this remote entry with a locally computed hash into a
    /// baseline entry
    pub fn into_file_info(self, hash: Option<FileHash>) -> FileInfo {
        FileInfo {
            path: self.path,
            kind: self.kind,
            version: self.version,
            hash,
            permissions: self.permissions,
        }
    }
}

/// An entry observed on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileState {
    /// Project-relative POSIX path
    pub path: RelativePath,
    /// File or directory
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Content digest (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<FileHash>,
}
