//! Upload-eligibility gate
//!
//! Before any local change travels to the server, every changed path is
//! checked against the remote permission model and platform naming rules.
//! The first violation aborts the run; nothing has been sent at that point.

use std::collections::BTreeMap;

use tracing::debug;

use campusdrive_core::domain::paths::{is_valid_dir_name, is_valid_file_name};
use campusdrive_core::domain::{
    LocalChangeKind, LocalFileChange, RelativePath, RemoteFileInfo, SyncError,
};

/// The vetted outcome of the gate: which paths go into the archive and
/// which are requested as server-side removals
///
/// Both lists are alphabetised so the archive and the signed payload are
/// deterministic for a given change set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPlan {
    /// Added or updated files, to be packed into the archive
    pub archive_paths: Vec<RelativePath>,
    /// Removed files, to be deleted server-side
    pub remove_files: Vec<RelativePath>,
}

impl UploadPlan {
    /// True when neither uploads nor removals are pending
    pub fn is_empty(&self) -> bool {
        self.archive_paths.is_empty() && self.remove_files.is_empty()
    }
}

/// Checks every local change against the remote inventory and produces an
/// [`UploadPlan`], or the first violation found
///
/// Rules per change kind:
/// - `Added`: the closest ancestor present in the remote inventory must be
///   writable; every newly introduced directory segment must be a valid
///   directory name; the file name itself must be valid.
/// - `Updated`: the entry must be writable on the remote.
/// - `Removed`: the entry and its closest existing ancestor must be
///   writable on the remote.
/// - `NoChange`: never reaches the gate; diffing only emits real changes.
pub fn check_upload_eligibility(
    changes: &[LocalFileChange],
    remote: &[RemoteFileInfo],
) -> Result<UploadPlan, SyncError> {
    let remote_by_path: BTreeMap<&RelativePath, &RemoteFileInfo> =
        remote.iter().map(|f| (&f.path, f)).collect();

    let mut plan = UploadPlan::default();

    let mut ordered: Vec<&LocalFileChange> = changes.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    for change in ordered {
        match change.change {
            LocalChangeKind::Added => {
                check_added(&change.path, &remote_by_path)?;
                plan.archive_paths.push(change.path.clone());
            }
            LocalChangeKind::Updated => {
                check_updated(&change.path, &remote_by_path)?;
                plan.archive_paths.push(change.path.clone());
            }
            LocalChangeKind::Removed => {
                check_removed(&change.path, &remote_by_path)?;
                plan.remove_files.push(change.path.clone());
            }
            LocalChangeKind::NoChange => {
                // Diffing never emits this; reaching it means the plan was
                // built from something other than a diff.
                return Err(SyncError::FileSystemCorrupted {
                    path: change.path.to_string(),
                    reason: "unchanged file in upload plan".to_string(),
                });
            }
        }
    }

    debug!(
        uploads = plan.archive_paths.len(),
        removals = plan.remove_files.len(),
        "upload plan vetted"
    );

    Ok(plan)
}

/// Walks `dirname(path)` upwards until an entry present in the remote
/// inventory is found
///
/// Reaching the project root without a hit means the tree the server sent
/// does not cover this path at all, which the caller treats as corruption.
fn closest_existing_ancestor<'a>(
    path: &RelativePath,
    remote_by_path: &BTreeMap<&RelativePath, &'a RemoteFileInfo>,
) -> Result<&'a RemoteFileInfo, SyncError> {
    let mut current = path.parent();
    while let Some(ancestor) = current {
        if let Some(entry) = remote_by_path.get(&ancestor) {
            return Ok(*entry);
        }
        current = ancestor.parent();
    }

    Err(SyncError::FileSystemCorrupted {
        path: path.to_string(),
        reason: "no ancestor of the path exists in the remote inventory".to_string(),
    })
}

fn check_added(
    path: &RelativePath,
    remote_by_path: &BTreeMap<&RelativePath, &RemoteFileInfo>,
) -> Result<(), SyncError> {
    let ancestor = closest_existing_ancestor(path, remote_by_path)?;
    if !ancestor.permissions.is_writable() {
        return Err(SyncError::ReadOnlyFilesChanged {
            path: path.to_string(),
            reason: format!("ancestor '{}' is read-only on the remote", ancestor.path),
        });
    }

    // Every directory segment introduced between the existing ancestor and
    // the new file must itself be creatable.
    let ancestor_depth = ancestor.path.depth();
    let segments: Vec<&str> = path.segments().collect();
    for segment in &segments[ancestor_depth..segments.len() - 1] {
        if !is_valid_dir_name(segment) {
            return Err(SyncError::FileSystemCorrupted {
                path: path.to_string(),
                reason: format!("'{segment}' is not a valid directory name"),
            });
        }
    }

    let name = path.file_name();
    if !is_valid_file_name(name) {
        return Err(SyncError::InvalidFilename {
            name: name.to_string(),
        });
    }

    Ok(())
}

fn check_updated(
    path: &RelativePath,
    remote_by_path: &BTreeMap<&RelativePath, &RemoteFileInfo>,
) -> Result<(), SyncError> {
    if let Some(entry) = remote_by_path.get(path) {
        if !entry.permissions.is_writable() {
            return Err(SyncError::ReadOnlyFilesChanged {
                path: path.to_string(),
                reason: "file is read-only on the remote".to_string(),
            });
        }
    }
    Ok(())
}

fn check_removed(
    path: &RelativePath,
    remote_by_path: &BTreeMap<&RelativePath, &RemoteFileInfo>,
) -> Result<(), SyncError> {
    if let Some(entry) = remote_by_path.get(path) {
        if !entry.permissions.is_writable() {
            return Err(SyncError::ReadOnlyFilesChanged {
                path: path.to_string(),
                reason: "file is read-only on the remote".to_string(),
            });
        }
        let ancestor = closest_existing_ancestor(path, remote_by_path)?;
        if !ancestor.permissions.is_writable() {
            return Err(SyncError::ReadOnlyFilesChanged {
                path: path.to_string(),
                reason: format!("ancestor '{}' is read-only on the remote", ancestor.path),
            });
        }
    }
    // Already gone on the server: the removal request is a no-op there.
    Ok(())
}
