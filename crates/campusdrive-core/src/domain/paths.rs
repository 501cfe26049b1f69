//! Path-segment escaping and name validity rules
//!
//! Project directories are derived from server-side metadata (semester,
//! course, exercise, task), which may contain characters that are illegal in
//! path segments on at least one supported platform. [`escape_segment`] maps
//! such names to safe, deterministic directory names; the mapping is
//! injective so two distinct names never collide on disk.
//!
//! The validity predicates mirror the platform rules for names the *user*
//! introduces locally and wants to upload.

use super::errors::DomainError;

/// Characters that may not appear in a path segment on any supported platform
///
/// `%` is included because it is the escape character itself; escaping it
/// keeps the mapping injective.
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '%'];

/// Windows reserved device names (case-insensitive, extension ignored)
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

// ============================================================================
// Segment escaping
// ============================================================================

/// Map a metadata string to a safe path segment
///
/// Forbidden characters and control characters are percent-encoded as `%XX`
/// (uppercase hex of the code point, which is always ASCII for the forbidden
/// class). All other characters pass through unchanged, so the result is
/// human-readable for typical course names.
///
/// The mapping is deterministic and injective: distinct inputs always
/// produce distinct outputs, because the only source of `%` in the output is
/// an escape sequence.
#[must_use]
pub fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for c in segment.chars() {
        if FORBIDDEN.contains(&c) || c.is_control() {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

// ============================================================================
// Name validity
// ============================================================================

/// Whether `name` is acceptable as a file name on all supported platforms
///
/// Rejects the empty string, path separators, control characters, characters
/// from the forbidden class, `.`/`..`, and Windows reserved device names
/// (matched against the stem, so `con.txt` is rejected too).
#[must_use]
pub fn is_valid_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name
        .chars()
        .any(|c| c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
    {
        return false;
    }
    // Windows refuses names ending in a dot or a space.
    if name.ends_with('.') || name.ends_with(' ') {
        return false;
    }

    let stem = name.split('.').next().unwrap_or(name);
    !RESERVED_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
}

/// Whether `name` is acceptable as a directory name on all supported platforms
///
/// Directories follow the same rules as files.
#[must_use]
pub fn is_valid_dir_name(name: &str) -> bool {
    is_valid_file_name(name)
}

/// Validate that `name` is a legal file name, for use in fallible pipelines
///
/// # Errors
/// Returns `DomainError::InvalidSegment` when [`is_valid_file_name`] rejects
/// the name.
pub fn ensure_valid_file_name(name: &str) -> Result<(), DomainError> {
    if is_valid_file_name(name) {
        Ok(())
    } else {
        Err(DomainError::InvalidSegment(name.to_string()))
    }
}
