//! Conflict detection over overlapping change sets
//!
//! A conflict is any path that changed on both sides since the baseline.
//! Independent additions of the same path count too: the contents may
//! coincide, but the engine does not inspect them and leaves the decision
//! to the user (force push/pull).

use tracing::info;

use campusdrive_core::domain::{ConflictingChange, LocalFileChange, RemoteFileChange};

/// Computes the path intersection of the two change sets
///
/// The result is ordered by path (both inputs are already alphabetised per
/// change kind; the output is re-sorted so callers can rely on it).
pub fn find_conflicts(
    local: &[LocalFileChange],
    remote: &[RemoteFileChange],
) -> Vec<ConflictingChange> {
    let mut conflicts: Vec<ConflictingChange> = local
        .iter()
        .filter_map(|lc| {
            remote
                .iter()
                .find(|rc| rc.path == lc.path)
                .map(|rc| ConflictingChange {
                    path: lc.path.clone(),
                    change_local: lc.change,
                    change_remote: rc.change,
                })
        })
        .collect();

    conflicts.sort_by(|a, b| a.path.cmp(&b.path));

    if !conflicts.is_empty() {
        info!(
            paths = conflicts.len(),
            "conflicting changes detected on both sides"
        );
    }

    conflicts
}
