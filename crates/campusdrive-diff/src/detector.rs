//! Baseline change detection
//!
//! Compares the persisted baseline against the latest inventory of one side
//! and reports what was added, removed or updated. Remote inventories are
//! compared by the server's version counter; local observations are compared
//! by content hash. Only regular files participate; directories are
//! reconciled by existence alone during planning.
//!
//! Changes are emitted in a stable order (removed, then added, then updated,
//! each alphabetised by path) so logs and archive contents are deterministic.

use std::collections::BTreeMap;

use tracing::debug;

use campusdrive_core::domain::{
    FileHash, FileInfo, LocalChangeKind, LocalFileChange, LocalFileState, RelativePath,
    RemoteChangeKind, RemoteFileChange, RemoteFileInfo,
};

/// Detects remote-side changes between the baseline and the latest
/// remote inventory
///
/// An entry counts as updated when its version differs from the baseline
/// version. An empty result means both sides agree.
pub fn diff_remote(previous: &[FileInfo], latest: &[RemoteFileInfo]) -> Vec<RemoteFileChange> {
    let previous: BTreeMap<&RelativePath, &FileInfo> = previous
        .iter()
        .filter(|f| f.kind.is_file())
        .map(|f| (&f.path, f))
        .collect();
    let latest: BTreeMap<&RelativePath, &RemoteFileInfo> = latest
        .iter()
        .filter(|f| f.kind.is_file())
        .map(|f| (&f.path, f))
        .collect();

    let mut changes = Vec::new();

    // Removed: in the baseline, gone from the latest inventory.
    for path in previous.keys() {
        if !latest.contains_key(*path) {
            changes.push(RemoteFileChange {
                path: (*path).clone(),
                change: RemoteChangeKind::Removed,
            });
        }
    }

    // Added: new in the latest inventory.
    for (path, entry) in &latest {
        if !previous.contains_key(*path) {
            changes.push(RemoteFileChange {
                path: (*path).clone(),
                change: RemoteChangeKind::Added {
                    version: entry.version,
                },
            });
        }
    }

    // Updated: present in both with a different version.
    for (path, entry) in &latest {
        if let Some(prev) = previous.get(*path) {
            if prev.version != entry.version {
                changes.push(RemoteFileChange {
                    path: (*path).clone(),
                    change: RemoteChangeKind::Updated {
                        version: entry.version,
                    },
                });
            }
        }
    }

    debug!(changes = changes.len(), "remote diff computed");
    changes
}

/// Detects local-side changes between the baseline and the observed
/// filesystem state
///
/// An entry counts as updated when its content hash differs from the
/// baseline hash.
pub fn diff_local(previous: &[FileInfo], latest: &[LocalFileState]) -> Vec<LocalFileChange> {
    let previous: BTreeMap<&RelativePath, &FileInfo> = previous
        .iter()
        .filter(|f| f.kind.is_file())
        .map(|f| (&f.path, f))
        .collect();
    let latest: BTreeMap<&RelativePath, &LocalFileState> = latest
        .iter()
        .filter(|f| f.kind.is_file())
        .map(|f| (&f.path, f))
        .collect();

    let mut changes = Vec::new();

    for path in previous.keys() {
        if !latest.contains_key(*path) {
            changes.push(LocalFileChange {
                path: (*path).clone(),
                change: LocalChangeKind::Removed,
            });
        }
    }

    for path in latest.keys() {
        if !previous.contains_key(*path) {
            changes.push(LocalFileChange {
                path: (*path).clone(),
                change: LocalChangeKind::Added,
            });
        }
    }

    for (path, observed) in &latest {
        if let Some(prev) = previous.get(*path) {
            if hashes_differ(prev.hash.as_ref(), observed.hash.as_ref()) {
                changes.push(LocalFileChange {
                    path: (*path).clone(),
                    change: LocalChangeKind::Updated,
                });
            }
        }
    }

    debug!(changes = changes.len(), "local diff computed");
    changes
}

/// Hash comparison with missing values: a file that gained or lost its hash
/// counts as changed, two absent hashes count as equal.
fn hashes_differ(previous: Option<&FileHash>, observed: Option<&FileHash>) -> bool {
    match (previous, observed) {
        (Some(a), Some(b)) => a != b,
        (None, None) => false,
        _ => true,
    }
}
