//! Project synchronisation engine
//!
//! The [`SyncEngine`] reconciles a local project directory with the
//! authoritative remote tree in one transactional run.
//!
//! ## Phases
//!
//! 1. **Setup**: resolve the project directory from settings
//! 2. **Inventory**: fetch the remote file list; scan and hash the local tree
//! 3. **Diff**: baseline vs remote (by version), baseline vs local (by hash)
//! 4. **Conflict gate**: overlapping paths abort the run unless forced
//! 5. **Plan**: vet uploads against permissions/naming, select downloads,
//!    deletions and directories
//! 6. **Apply**: upload archive, ensure directories, download files,
//!    delete local files removed remotely
//! 7. **Commit**: re-fetch the inventory, re-hash, atomically persist the
//!    new baseline (promoting `Remote` projects to `Local`)
//!
//! A failure in any phase aborts the run *before* the commit, so the
//! persisted baseline always reflects the last successful sync and a retry
//! re-converges. The engine never retries by itself.
//!
//! Cancellation is cooperative: the token is checked between phases and
//! between individual files; an in-flight request or single-file write
//! always completes.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use campusdrive_archive::build_archive_blocking;
use campusdrive_core::domain::{
    FileInfo, LocalFileChange, LocalState, Project, RelativePath, RemoteChangeKind,
    RemoteFileChange, RemoteFileInfo, SyncError, SyncState,
};
use campusdrive_core::ports::{
    ApiError, IMetadataStore, IProjectApi, ISettingsStore, ProjectArchive,
};
use campusdrive_diff::{check_upload_eligibility, diff_local, diff_remote, find_conflicts};

use crate::fsops;

// ============================================================================
// Run inputs and outputs
// ============================================================================

/// User-approved override discarding one side's changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Keep local changes; remote changes are neither detected nor applied
    Push,
    /// Keep remote changes; local changes are neither detected nor uploaded
    Pull,
}

/// Summary of a completed synchronisation run
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The committed project record (always `Local` after a run)
    pub project: Project,
    /// Number of files packed into the upload archive
    pub files_uploaded: u32,
    /// Number of files downloaded and written
    pub files_downloaded: u32,
    /// Number of local files deleted because the remote removed them
    pub files_deleted: u32,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

/// How a run ended when it did not fail
#[derive(Debug)]
pub enum SyncRun {
    /// The run committed a new baseline
    Completed(SyncOutcome),
    /// The cancel token fired between two steps; nothing was committed
    Cancelled,
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Drives one synchronisation run end-to-end
///
/// ## Dependencies
///
/// - `api`: signed operations against the course server
/// - `store`: the durable project record store (written once, at commit)
/// - `settings`: source of the configured project root directory
///
/// At most one run per project may be in flight; callers enforce this by
/// observing [`SyncState::Syncing`] on the project record.
pub struct SyncEngine {
    /// Course-server operations
    api: Arc<dyn IProjectApi>,
    /// Persistent project records
    store: Arc<dyn IMetadataStore>,
    /// Opaque settings (project root directory)
    settings: Arc<dyn ISettingsStore>,
}

impl SyncEngine {
    /// Creates an engine with the given dependencies
    pub fn new(
        api: Arc<dyn IProjectApi>,
        store: Arc<dyn IMetadataStore>,
        settings: Arc<dyn ISettingsStore>,
    ) -> Self {
        Self {
            api,
            store,
            settings,
        }
    }

    /// Performs one synchronisation run for `project`
    ///
    /// # Errors
    /// Returns the first [`SyncError`] encountered; the metadata store is
    /// untouched in that case.
    #[instrument(skip(self, project, cancel), fields(project = %project.id(), ?force))]
    pub async fn sync_project(
        &self,
        project: &Project,
        force: Option<ForceMode>,
        cancel: &CancellationToken,
    ) -> Result<SyncRun, SyncError> {
        let started = std::time::Instant::now();

        // Phase 1: setup -------------------------------------------------
        let root = match self.settings.project_dir().await {
            Ok(Some(root)) => root,
            Ok(None) => return Err(SyncError::ProjectDirMissing),
            Err(e) => {
                return Err(SyncError::FileSystemCorrupted {
                    path: "settings.json".to_string(),
                    reason: format!("{e:#}"),
                })
            }
        };

        let rel_dir = project.relative_dir().map_err(|e| {
            SyncError::FileSystemCorrupted {
                path: project.id().to_string(),
                reason: format!("cannot derive project directory: {e}"),
            }
        })?;
        let project_dir = Path::new(&root).join(rel_dir.to_native());

        info!(dir = %project_dir.display(), "starting sync run");

        // Phase 2: inventory ---------------------------------------------
        if cancel.is_cancelled() {
            return Ok(SyncRun::Cancelled);
        }

        let remote = self
            .api
            .project_info(project.id())
            .await
            .map_err(map_api_error)?;

        let local = if project.is_local() {
            Some(
                fsops::observe_local_state(&project_dir)
                    .await
                    .map_err(|e| fs_corrupted(&project_dir, &e))?,
            )
        } else {
            None
        };

        let baseline = project.baseline();

        // Phase 3: diff ---------------------------------------------------
        let remote_changes: Vec<RemoteFileChange> = match force {
            Some(ForceMode::Push) => Vec::new(),
            _ => diff_remote(baseline.unwrap_or(&[]), &remote.files),
        };

        let local_changes: Vec<LocalFileChange> = match (force, baseline, &local) {
            (Some(ForceMode::Pull), _, _) => Vec::new(),
            (_, Some(baseline), Some(local)) => diff_local(baseline, local),
            _ => Vec::new(),
        };

        debug!(
            remote = remote_changes.len(),
            local = local_changes.len(),
            "diffs computed"
        );

        // Phase 4: conflict gate ------------------------------------------
        if force.is_none() && !remote_changes.is_empty() && !local_changes.is_empty() {
            let conflicts = find_conflicts(&local_changes, &remote_changes);
            if !conflicts.is_empty() {
                return Err(SyncError::ConflictingChanges { conflicts });
            }
        }

        // Phase 5: plan ---------------------------------------------------
        let upload_plan = check_upload_eligibility(&local_changes, &remote.files)?;
        let files_to_download = plan_downloads(&remote.files, &remote_changes);
        let files_to_delete = plan_deletions(&remote_changes);
        let dirs_to_ensure = plan_directories(&remote.files);

        debug!(
            uploads = upload_plan.archive_paths.len(),
            removals = upload_plan.remove_files.len(),
            downloads = files_to_download.len(),
            deletions = files_to_delete.len(),
            "run planned"
        );

        // Phase 6a: upload ------------------------------------------------
        if cancel.is_cancelled() {
            return Ok(SyncRun::Cancelled);
        }

        let files_uploaded = upload_plan.archive_paths.len() as u32;
        if !upload_plan.is_empty() {
            let archive = if upload_plan.archive_paths.is_empty() {
                None
            } else {
                Some(
                    self.build_upload_archive(project, &project_dir, &upload_plan.archive_paths)
                        .await?,
                )
            };

            let returned = self
                .api
                .upload_files(project.id(), archive.as_ref(), &upload_plan.remove_files)
                .await
                .map_err(map_api_error)?;

            debug!(
                entries = returned.files.len(),
                "server acknowledged upload with updated inventory"
            );
        }

        // Phases 6b-6d only pull state down; a forced push skips them.
        let mut files_downloaded: u32 = 0;
        let mut files_deleted: u32 = 0;

        if force != Some(ForceMode::Push) {
            // Phase 6b: ensure directories, shallow first. They stay
            // writable until the tree is populated; final modes are pinned
            // after the write phase.
            for dir_entry in &dirs_to_ensure {
                let target = project_dir.join(dir_entry.path.to_native());
                fsops::make_dir(&target)
                    .await
                    .map_err(|e| fs_corrupted(&target, &e))?;
            }

            // Phase 6c: downloads, sequential so filesystem errors stay
            // deterministic.
            for entry in &files_to_download {
                if cancel.is_cancelled() {
                    return Ok(SyncRun::Cancelled);
                }

                let content = self
                    .api
                    .download_file(project.id(), &entry.path)
                    .await
                    .map_err(map_api_error)?;

                let target = project_dir.join(entry.path.to_native());
                fsops::write_file_atomic(&target, content.as_bytes(), entry.permissions)
                    .await
                    .map_err(|e| fs_corrupted(&target, &e))?;

                let written = fsops::hash_file(&target)
                    .await
                    .map_err(|e| fs_corrupted(&target, &e))?;
                debug!(path = %entry.path, hash = %written, "file downloaded");

                files_downloaded += 1;
            }

            // Phase 6d: delete local files the remote removed.
            for path in &files_to_delete {
                if cancel.is_cancelled() {
                    return Ok(SyncRun::Cancelled);
                }

                let target = project_dir.join(path.to_native());
                fsops::remove_file_if_exists(&target)
                    .await
                    .map_err(|e| fs_corrupted(&target, &e))?;
                files_deleted += 1;
            }

            // Pin final directory modes now that every write landed.
            for dir_entry in &dirs_to_ensure {
                let target = project_dir.join(dir_entry.path.to_native());
                fsops::apply_dir_permissions(&target, dir_entry.permissions)
                    .await
                    .map_err(|e| fs_corrupted(&target, &e))?;
            }
        }

        // Phase 7: commit -------------------------------------------------
        if cancel.is_cancelled() {
            return Ok(SyncRun::Cancelled);
        }

        let final_inventory = self
            .api
            .project_info(project.id())
            .await
            .map_err(map_api_error)?;

        let files = self
            .build_baseline(&project_dir, final_inventory.files)
            .await?;

        let committed = Project::Local {
            metadata: project.metadata().clone(),
            state: LocalState {
                base_path: rel_dir,
                files,
                synced_at: Utc::now(),
                sync_state: SyncState::fresh(),
            },
        };

        self.store.upsert(&committed).await.map_err(|e| {
            SyncError::FileSystemCorrupted {
                path: "project_metadata.json".to_string(),
                reason: format!("{e:#}"),
            }
        })?;

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            uploaded = files_uploaded,
            downloaded = files_downloaded,
            deleted = files_deleted,
            duration_ms,
            "sync run committed"
        );

        Ok(SyncRun::Completed(SyncOutcome {
            project: committed,
            files_uploaded,
            files_downloaded,
            files_deleted,
            duration_ms,
        }))
    }

    /// Deletes the local project tree (if any) and the stored record
    ///
    /// The inverse of the `Remote -> Local` promotion; afterwards the
    /// project is unknown to this client.
    #[instrument(skip(self, project), fields(project = %project.id()))]
    pub async fn remove_project(&self, project: &Project) -> anyhow::Result<()> {
        if let Some(state) = project.local_state() {
            if let Some(root) = self.settings.project_dir().await? {
                let dir = Path::new(&root).join(state.base_path.to_native());
                fsops::remove_tree(&dir).await?;
                info!(dir = %dir.display(), "project tree removed");
            }
        }

        self.store.remove(project.id()).await
    }

    /// Materialises the upload archive in the temp directory and reads it
    /// back for the request body
    async fn build_upload_archive(
        &self,
        project: &Project,
        project_dir: &Path,
        paths: &[RelativePath],
    ) -> Result<ProjectArchive, SyncError> {
        let out_path = fsops::temp_dir().join(format!(
            "project_{}_{}.tar.br",
            project.id(),
            Utc::now().timestamp_millis()
        ));

        let content_hash = build_archive_blocking(
            out_path.clone(),
            project_dir.to_path_buf(),
            paths.to_vec(),
        )
        .await
        .map_err(|e| fs_corrupted(&out_path, &e))?;

        let bytes = tokio::fs::read(&out_path)
            .await
            .map_err(|e| fs_corrupted(&out_path, &anyhow::Error::from(e)))?;

        if let Err(e) = tokio::fs::remove_file(&out_path).await {
            warn!(path = %out_path.display(), error = %e, "failed to clean up archive");
        }

        debug!(
            files = paths.len(),
            bytes = bytes.len(),
            hash = %content_hash,
            "upload archive built"
        );

        Ok(ProjectArchive {
            bytes,
            content_hash,
        })
    }

    /// Hashes every file of the final inventory and combines it into the
    /// new baseline
    ///
    /// A file the server lists but the run never materialised locally
    /// (possible under `force = Push`) keeps an empty hash; the next
    /// unforced run surfaces it as a local removal.
    async fn build_baseline(
        &self,
        project_dir: &Path,
        inventory: Vec<RemoteFileInfo>,
    ) -> Result<Vec<FileInfo>, SyncError> {
        let entries = inventory.into_iter().map(|entry| async move {
            let hash = if entry.kind.is_file() {
                let abs = project_dir.join(entry.path.to_native());
                if fsops::exists(&abs).await {
                    Some(
                        fsops::hash_file(&abs)
                            .await
                            .map_err(|e| fs_corrupted(&abs, &e))?,
                    )
                } else {
                    None
                }
            } else {
                None
            };
            Ok::<FileInfo, SyncError>(entry.into_file_info(hash))
        });

        let mut files = try_join_all(entries).await?;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

// ============================================================================
// Planning helpers
// ============================================================================

/// Remote file entries that were added or updated since the baseline,
/// ordered by path
fn plan_downloads<'a>(
    remote: &'a [RemoteFileInfo],
    changes: &[RemoteFileChange],
) -> Vec<&'a RemoteFileInfo> {
    let wanted: BTreeSet<&RelativePath> = changes
        .iter()
        .filter(|c| {
            matches!(
                c.change,
                RemoteChangeKind::Added { .. } | RemoteChangeKind::Updated { .. }
            )
        })
        .map(|c| &c.path)
        .collect();

    let mut downloads: Vec<&RemoteFileInfo> = remote
        .iter()
        .filter(|f| f.kind.is_file() && wanted.contains(&f.path))
        .collect();
    downloads.sort_by(|a, b| a.path.cmp(&b.path));
    downloads
}

/// Paths removed on the remote, to be deleted locally, ordered by path
fn plan_deletions(changes: &[RemoteFileChange]) -> Vec<RelativePath> {
    let mut deletions: Vec<RelativePath> = changes
        .iter()
        .filter(|c| matches!(c.change, RemoteChangeKind::Removed))
        .map(|c| c.path.clone())
        .collect();
    deletions.sort();
    deletions
}

/// Remote directory entries, shallow first so parents precede children
fn plan_directories(remote: &[RemoteFileInfo]) -> Vec<&RemoteFileInfo> {
    let mut dirs: Vec<&RemoteFileInfo> = remote.iter().filter(|f| !f.kind.is_file()).collect();
    dirs.sort_by(|a, b| a.path.depth().cmp(&b.path.depth()).then(a.path.cmp(&b.path)));
    dirs
}

// ============================================================================
// Error mapping
// ============================================================================

/// Maps an API failure onto the run taxonomy
///
/// `NotReady` signals a host that wired an uninitialised signer; there is
/// no sensible recovery inside a run.
fn map_api_error(e: ApiError) -> SyncError {
    match e {
        ApiError::NotReady => panic!("API signer is not initialised"),
        ApiError::NoNetwork { reason } => SyncError::NetworkError { reason },
        ApiError::ClientError { status, message } => SyncError::NetworkError {
            reason: format!("HTTP {status}: {message}"),
        },
        ApiError::ServerError { status, message } => SyncError::NetworkError {
            reason: format!("HTTP {status}: {message}"),
        },
    }
}

fn fs_corrupted(path: &Path, e: &anyhow::Error) -> SyncError {
    SyncError::FileSystemCorrupted {
        path: path.display().to_string(),
        reason: format!("{e:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusdrive_core::domain::{EntryKind, FilePermissions};

    fn remote(path: &str, kind: EntryKind, version: u64) -> RemoteFileInfo {
        RemoteFileInfo {
            path: RelativePath::new(path).unwrap(),
            kind,
            version,
            permissions: FilePermissions::ReadWrite,
        }
    }

    fn change(path: &str, kind: RemoteChangeKind) -> RemoteFileChange {
        RemoteFileChange {
            path: RelativePath::new(path).unwrap(),
            change: kind,
        }
    }

    #[test]
    fn test_plan_downloads_selects_added_and_updated_files() {
        let inventory = vec![
            remote("a.txt", EntryKind::File, 1),
            remote("b.txt", EntryKind::File, 2),
            remote("lib", EntryKind::Dir, 1),
        ];
        let changes = vec![
            change("a.txt", RemoteChangeKind::Added { version: 1 }),
            change("b.txt", RemoteChangeKind::Updated { version: 2 }),
            change("gone.txt", RemoteChangeKind::Removed),
        ];

        let downloads = plan_downloads(&inventory, &changes);
        let paths: Vec<&str> = downloads.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_plan_downloads_never_selects_directories() {
        let inventory = vec![remote("lib", EntryKind::Dir, 1)];
        let changes = vec![change("lib", RemoteChangeKind::Added { version: 1 })];

        assert!(plan_downloads(&inventory, &changes).is_empty());
    }

    #[test]
    fn test_plan_deletions() {
        let changes = vec![
            change("z.txt", RemoteChangeKind::Removed),
            change("a.txt", RemoteChangeKind::Removed),
            change("kept.txt", RemoteChangeKind::Updated { version: 2 }),
        ];

        let deletions = plan_deletions(&changes);
        let paths: Vec<&str> = deletions.iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "z.txt"]);
    }

    #[test]
    fn test_plan_directories_shallow_first() {
        let inventory = vec![
            remote("a/b/c", EntryKind::Dir, 1),
            remote("a", EntryKind::Dir, 1),
            remote("a/b", EntryKind::Dir, 1),
            remote("file.txt", EntryKind::File, 1),
        ];

        let dirs = plan_directories(&inventory);
        let paths: Vec<&str> = dirs.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "a/b", "a/b/c"]);
    }

    #[test]
    fn test_map_api_error_network() {
        let err = map_api_error(ApiError::NoNetwork {
            reason: "timeout".to_string(),
        });
        assert!(matches!(err, SyncError::NetworkError { reason } if reason == "timeout"));

        let err = map_api_error(ApiError::ServerError {
            status: 502,
            message: "bad gateway".to_string(),
        });
        assert!(matches!(err, SyncError::NetworkError { reason } if reason.contains("502")));
    }

    #[test]
    #[should_panic(expected = "signer is not initialised")]
    fn test_map_api_error_not_ready_panics() {
        map_api_error(ApiError::NotReady);
    }
}
