//! Local filesystem primitives
//!
//! All project I/O goes through this module, which uses `tokio::fs` for
//! async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: write-to-temp + rename avoids partial files on
//!   crash or power loss.
//! - **Streaming hashes**: file digests are computed on a blocking worker
//!   with a fixed-size buffer, so large files never occupy the async
//!   runtime or memory.
//! - **Junk filtering**: tree scans skip hidden entries and well-known OS
//!   and editor artefacts; symlinks are never followed.
//! - **Permission mapping**: the remote `r`/`rw` permission becomes a Unix
//!   file mode on write (and a best-effort readonly flag elsewhere).

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use data_encoding::HEXLOWER;
use futures::future::try_join_all;
use sha2::{Digest, Sha256};
use tracing::debug;

use campusdrive_core::domain::{EntryKind, FileHash, FilePermissions, LocalFileState, RelativePath};

/// Buffer size for streaming hash computation
const HASH_BUFFER: usize = 64 * 1024;

// ============================================================================
// Visibility
// ============================================================================

/// Whether an entry name belongs to the project content
///
/// Hidden entries (dot-prefixed) and well-known OS/editor artefacts are
/// invisible to synchronisation in both directions.
#[must_use]
pub fn is_visible_entry(name: &str) -> bool {
    if name.starts_with('.') {
        // Covers .git, .DS_Store, .idea, dot-prefixed swap files, ...
        return false;
    }
    if name.eq_ignore_ascii_case("thumbs.db") || name.eq_ignore_ascii_case("desktop.ini") {
        return false;
    }
    // Editor leftovers: vim swap files and backup tildes.
    if name.ends_with(".swp") || name.ends_with(".swo") || name.ends_with('~') {
        return false;
    }
    true
}

// ============================================================================
// Path helpers
// ============================================================================

/// Returns the suffix of `abs` below `root` as a [`RelativePath`]
///
/// # Errors
/// Fails when `abs` is not below `root` or a component is not valid UTF-8.
pub fn strip_ancestor(root: &Path, abs: &Path) -> Result<RelativePath> {
    let suffix = abs
        .strip_prefix(root)
        .map_err(|_| anyhow!("{} is not below {}", abs.display(), root.display()))?;

    let mut segments = Vec::new();
    for component in suffix.components() {
        let segment = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| anyhow!("non-UTF-8 path component in {}", abs.display()))?;
        segments.push(segment);
    }

    RelativePath::new(segments.join("/"))
        .map_err(|e| anyhow!("cannot relativise {}: {e}", abs.display()))
}

/// The directory used for staging upload archives
#[must_use]
pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Whether `path` exists (any kind of entry)
pub async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

// ============================================================================
// Tree scanning
// ============================================================================

/// Recursively lists every visible entry below `root`
///
/// Symlinks are reported by neither kind and not followed. The result is
/// sorted by path so downstream processing is deterministic.
pub async fn scan_tree(root: &Path) -> Result<Vec<(RelativePath, EntryKind)>> {
    let mut entries = Vec::new();
    walk(root, root, &mut entries).await?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn walk<'a>(
    dir: &'a Path,
    root: &'a Path,
    entries: &'a mut Vec<(RelativePath, EntryKind)>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut dir_entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        while let Some(entry) = dir_entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                return Err(anyhow!(
                    "non-UTF-8 entry name in {}",
                    dir.display()
                ));
            };
            if !is_visible_entry(name) {
                continue;
            }

            let file_type = entry.file_type().await?;
            if file_type.is_symlink() {
                debug!(path = %entry.path().display(), "skipping symlink");
                continue;
            }

            let rel = strip_ancestor(root, &entry.path())?;
            if file_type.is_dir() {
                entries.push((rel, EntryKind::Dir));
                walk(&entry.path(), root, entries).await?;
            } else if file_type.is_file() {
                entries.push((rel, EntryKind::File));
            }
        }

        Ok(())
    })
}

/// Scans `root` and hashes every file, yielding the observed local state
///
/// Hashing runs in parallel across files; the first failure aborts the
/// whole observation.
pub async fn observe_local_state(root: &Path) -> Result<Vec<LocalFileState>> {
    let entries = scan_tree(root).await?;

    let observations = entries.into_iter().map(|(rel, kind)| {
        let abs = root.join(rel.to_native());
        async move {
            let hash = match kind {
                EntryKind::File => Some(hash_file(&abs).await?),
                EntryKind::Dir => None,
            };
            Ok::<LocalFileState, anyhow::Error>(LocalFileState {
                path: rel,
                kind,
                hash,
            })
        }
    });

    try_join_all(observations).await
}

// ============================================================================
// Hashing
// ============================================================================

/// Streaming SHA-256 of a file's content, hex-encoded
///
/// The digest depends only on the byte sequence, so it is stable across
/// platforms.
pub async fn hash_file(path: &Path) -> Result<FileHash> {
    let path = path.to_path_buf();

    let digest = tokio::task::spawn_blocking(move || -> Result<String> {
        use std::io::Read;

        let mut file = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; HASH_BUFFER];

        loop {
            let read = file
                .read(&mut buffer)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(HEXLOWER.encode(hasher.finalize().as_ref()))
    })
    .await
    .context("Hashing task panicked")??;

    FileHash::new(digest).map_err(|e| anyhow!("computed digest is malformed: {e}"))
}

// ============================================================================
// Writing
// ============================================================================

/// Writes `content` to `path` atomically, creating parent directories,
/// and applies the mode derived from `permissions`
///
/// The content goes to a temporary sibling first; the rename makes the new
/// version visible in one step even if the old file was read-only.
pub async fn write_file_atomic(
    path: &Path,
    content: &[u8],
    permissions: FilePermissions,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp_path = {
        let mut p = path.as_os_str().to_owned();
        p.push(".tmp");
        PathBuf::from(p)
    };

    tokio::fs::write(&tmp_path, content)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;

    set_mode(&tmp_path, permissions.file_mode()).await?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to move {} into place", path.display()))?;

    debug!(path = %path.display(), bytes = content.len(), "file written");
    Ok(())
}

/// Creates `path` (and parents) as a writable directory
///
/// Directories stay writable while a sync run populates them;
/// [`apply_dir_permissions`] pins the final mode afterwards.
pub async fn make_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    set_mode(path, FilePermissions::ReadWrite.dir_mode()).await
}

/// Applies the final mode of a directory after the tree is populated
pub async fn apply_dir_permissions(path: &Path, permissions: FilePermissions) -> Result<()> {
    set_mode(path, permissions.dir_mode()).await
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .with_context(|| format!("Failed to set mode on {}", path.display()))
}

#[cfg(not(unix))]
async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    // Windows only knows a readonly flag; owner-write decides it.
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let mut permissions = metadata.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    tokio::fs::set_permissions(path, permissions)
        .await
        .with_context(|| format!("Failed to set mode on {}", path.display()))
}

// ============================================================================
// Removal
// ============================================================================

/// Removes a file; a missing file is not an error
pub async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "file removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Removes a directory tree, re-opening read-only directories first
///
/// Synced trees can contain read-only directories, which
/// `remove_dir_all` cannot descend into on Unix.
pub async fn remove_tree(path: &Path) -> Result<()> {
    if !exists(path).await {
        return Ok(());
    }

    unlock_dirs(path).await?;
    tokio::fs::remove_dir_all(path)
        .await
        .with_context(|| format!("Failed to remove {}", path.display()))
}

fn unlock_dirs(
    dir: &Path,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + '_>> {
    Box::pin(async move {
        set_mode(dir, FilePermissions::ReadWrite.dir_mode()).await?;

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                unlock_dirs(&entry.path()).await?;
            }
        }
        Ok(())
    })
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_visibility_rules() {
        assert!(is_visible_entry("main.c"));
        assert!(is_visible_entry("Makefile"));

        assert!(!is_visible_entry(".git"));
        assert!(!is_visible_entry(".DS_Store"));
        assert!(!is_visible_entry("Thumbs.db"));
        assert!(!is_visible_entry("thumbs.db"));
        assert!(!is_visible_entry("main.c.swp"));
        assert!(!is_visible_entry("notes.txt~"));
    }

    #[test]
    fn test_strip_ancestor() {
        let rel = strip_ancestor(Path::new("/root/project"), Path::new("/root/project/a/b.txt"))
            .unwrap();
        assert_eq!(rel.as_str(), "a/b.txt");

        assert!(strip_ancestor(Path::new("/root/project"), Path::new("/elsewhere/x")).is_err());
    }

    #[tokio::test]
    async fn test_scan_tree_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("src/a.c"), b"a").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();
        std::fs::write(dir.path().join(".git/config"), b"junk").unwrap();

        let entries = scan_tree(dir.path()).await.unwrap();
        let names: Vec<(&str, EntryKind)> = entries
            .iter()
            .map(|(p, k)| (p.as_str(), *k))
            .collect();

        assert_eq!(
            names,
            vec![
                ("b.txt", EntryKind::File),
                ("src", EntryKind::Dir),
                ("src/a.c", EntryKind::File),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scan_tree_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("real.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let entries = scan_tree(dir.path()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.as_str(), "real.txt");
    }

    #[tokio::test]
    async fn test_hash_file_is_content_addressed() {
        let dir = TempDir::new().unwrap();
        let p1 = dir.path().join("one.txt");
        let p2 = dir.path().join("two.txt");
        std::fs::write(&p1, b"same bytes").unwrap();
        std::fs::write(&p2, b"same bytes").unwrap();

        let h1 = hash_file(&p1).await.unwrap();
        let h2 = hash_file(&p2).await.unwrap();
        assert_eq!(h1, h2);

        std::fs::write(&p2, b"other bytes").unwrap();
        let h3 = hash_file(&p2).await.unwrap();
        assert_ne!(h1, h3);
    }

    #[tokio::test]
    async fn test_hash_matches_known_digest() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("empty");
        std::fs::write(&p, b"").unwrap();

        // SHA-256 of the empty string.
        let h = hash_file(&p).await.unwrap();
        assert_eq!(
            h.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_observe_local_state_hashes_files_only() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/a.c"), b"a").unwrap();

        let state = observe_local_state(dir.path()).await.unwrap();
        assert_eq!(state.len(), 2);

        let dir_entry = state.iter().find(|s| s.path.as_str() == "lib").unwrap();
        assert!(dir_entry.hash.is_none());

        let file_entry = state.iter().find(|s| s.path.as_str() == "lib/a.c").unwrap();
        assert!(file_entry.hash.is_some());
    }

    #[tokio::test]
    async fn test_write_file_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("deep/nested/file.txt");

        write_file_atomic(&target, b"content", FilePermissions::ReadWrite)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"content");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_file_atomic_sets_read_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("ro.txt");

        write_file_atomic(&target, b"locked", FilePermissions::ReadOnly)
            .await
            .unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }

    #[tokio::test]
    async fn test_write_file_atomic_overwrites_read_only_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("ro.txt");

        write_file_atomic(&target, b"v1", FilePermissions::ReadOnly)
            .await
            .unwrap();
        // A forced pull replaces read-only content.
        write_file_atomic(&target, b"v2", FilePermissions::ReadOnly)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("file.txt");

        write_file_atomic(&target, b"x", FilePermissions::ReadWrite)
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_remove_file_if_exists_ignores_missing() {
        let dir = TempDir::new().unwrap();
        remove_file_if_exists(&dir.path().join("ghost.txt"))
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remove_tree_handles_read_only_dirs() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        let locked = project.join("locked");

        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("file.txt"), b"x").unwrap();
        apply_dir_permissions(&locked, FilePermissions::ReadOnly)
            .await
            .unwrap();

        remove_tree(&project).await.unwrap();
        assert!(!exists(&project).await);
    }
}
