//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and
//! values. Each newtype ensures data validity at construction time, including
//! at deserialisation (`serde(try_from)`).

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// ProjectId
// ============================================================================

/// Opaque identifier for a project, assigned by the course server
///
/// The value is never interpreted by the client; it is only required to be
/// non-empty and free of whitespace so it can appear in URL paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Create a ProjectId, validating it is non-empty and whitespace-free
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidId("empty project id".to_string()));
        }
        if id.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(DomainError::InvalidId(format!(
                "project id contains illegal characters: {id}"
            )));
        }
        Ok(Self(id))
    }

    /// The raw identifier string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

// ============================================================================
// RelativePath
// ============================================================================

/// A validated project-relative path in POSIX form
///
/// Every path in an inventory or baseline satisfies:
/// - relative (never starts with `/`)
/// - `/`-separated, no backslashes
/// - no `.` or `..` segments, no empty segments
/// - no control characters
///
/// A single trailing slash (as some inventories use for directories) is
/// stripped on construction, so equal trees compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
    /// Create a RelativePath, validating and normalising the input
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` when the input is absolute, empty,
    /// contains `.`/`..`/empty segments, backslashes or control characters.
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let mut path = path.into();
        if path.ends_with('/') {
            path.pop();
        }

        if path.is_empty() {
            return Err(DomainError::InvalidPath("empty path".to_string()));
        }
        if path.starts_with('/') {
            return Err(DomainError::InvalidPath(format!(
                "path must be relative: {path}"
            )));
        }
        if path.contains('\\') {
            return Err(DomainError::InvalidPath(format!(
                "path must use '/' separators: {path}"
            )));
        }
        if path.chars().any(|c| c.is_control()) {
            return Err(DomainError::InvalidPath(
                "path contains control characters".to_string(),
            ));
        }
        for segment in path.split('/') {
            if segment.is_empty() {
                return Err(DomainError::InvalidPath(format!(
                    "path contains an empty segment: {path}"
                )));
            }
            if segment == "." || segment == ".." {
                return Err(DomainError::InvalidPath(format!(
                    "path contains a relative segment: {path}"
                )));
            }
        }

        Ok(Self(path))
    }

    /// The normalised POSIX string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterator over the path segments, root-most first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Number of segments (`a/b/c` has depth 3)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    /// The final segment
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The parent path, or `None` for a top-level entry
    #[must_use]
    pub fn parent(&self) -> Option<RelativePath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Append a single segment
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` when the segment is itself invalid.
    pub fn join(&self, segment: &str) -> Result<RelativePath, DomainError> {
        Self::new(format!("{}/{}", self.0, segment))
    }

    /// True if `self` equals `other` or lies underneath it
    #[must_use]
    pub fn starts_with(&self, other: &RelativePath) -> bool {
        self.0 == other.0 || self.0.starts_with(&format!("{}/", other.0))
    }

    /// Convert to a native path (OS separators), suitable for joining onto
    /// an absolute root directory
    #[must_use]
    pub fn to_native(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RelativePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.0
    }
}

// ============================================================================
// FileHash
// ============================================================================

/// A content digest: lowercase hex SHA-256 (64 characters)
///
/// The same algorithm is used for local file contents and for uploaded
/// archives, so digests are comparable across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileHash(String);

impl FileHash {
    /// Length of a hex-encoded SHA-256 digest
    const HEX_LEN: usize = 64;

    /// Create a FileHash, validating the hex encoding
    pub fn new(hash: impl Into<String>) -> Result<Self, DomainError> {
        let hash = hash.into();
        if hash.len() != Self::HEX_LEN {
            return Err(DomainError::InvalidHash(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                hash.len()
            )));
        }
        if !hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(DomainError::InvalidHash(format!(
                "not lowercase hex: {hash}"
            )));
        }
        Ok(Self(hash))
    }

    /// The hex string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FileHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileHash {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FileHash {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileHash> for String {
    fn from(hash: FileHash) -> Self {
        hash.0
    }
}
