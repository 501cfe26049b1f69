//! Reproducible brotli-compressed tar builder
//!
//! The upload payload is a tar of the changed files, compressed with brotli
//! and written straight to disk while a SHA-256 of the *compressed* stream
//! is computed in the same pass. The server checks that digest against the
//! `tarHash` field of the signed request payload.
//!
//! For a fixed file list the output is byte-identical across runs: entries
//! are appended in the order given, entry names are the POSIX-relative
//! paths, and header metadata (mtime, uid, gid, mode) is pinned to
//! constants.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brotli::CompressorWriter;
use data_encoding::HEXLOWER;
use sha2::{Digest, Sha256};
use tracing::debug;

use campusdrive_core::domain::{FileHash, RelativePath};

use crate::tee::TeeWriter;

/// Brotli encoder buffer size in bytes
const BROTLI_BUFFER: usize = 4096;

/// Brotli quality (0-11); uploads are small, so maximum compression wins
const BROTLI_QUALITY: u32 = 11;

/// Brotli window size exponent
const BROTLI_LG_WINDOW: u32 = 20;

/// Tar mode for every archived file
const ENTRY_MODE: u32 = 0o644;

/// Builds `out_path` as a brotli-compressed tar of `files` (resolved
/// against `root_dir`) and returns the digest of the compressed output
///
/// Entry names equal the given relative paths. The caller is responsible
/// for passing files only; directories are never archived.
///
/// # Errors
/// Fails when a listed file cannot be opened or read, or the archive
/// cannot be written.
pub fn build_archive(
    out_path: &Path,
    root_dir: &Path,
    files: &[RelativePath],
) -> Result<FileHash> {
    let out = File::create(out_path)
        .with_context(|| format!("Failed to create archive at {}", out_path.display()))?;

    let tee = TeeWriter::new(out, Sha256::new());
    let compressor = CompressorWriter::new(tee, BROTLI_BUFFER, BROTLI_QUALITY, BROTLI_LG_WINDOW);
    let mut archive = tar::Builder::new(compressor);

    for rel in files {
        let abs = root_dir.join(rel.to_native());
        debug!(path = %rel, "adding file to archive");

        let mut file = File::open(&abs)
            .with_context(|| format!("Failed to open {} for archiving", abs.display()))?;
        let metadata = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", abs.display()))?;

        let mut header = tar::Header::new_gnu();
        header.set_size(metadata.len());
        header.set_mode(ENTRY_MODE);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);

        archive
            .append_data(&mut header, rel.as_str(), &mut file)
            .with_context(|| format!("Failed to append {} to archive", rel))?;
    }

    let compressor = archive
        .into_inner()
        .context("Failed to finalise tar archive")?;
    // into_inner flushes the remaining brotli block before handing the
    // tee back.
    let tee = compressor.into_inner();
    let (_, hasher) = tee.into_inner();

    let digest = HEXLOWER.encode(hasher.finalize().as_ref());
    debug!(files = files.len(), hash = %digest, "archive built");

    FileHash::new(digest).context("Archive digest is not a valid hash")
}

/// Async wrapper: runs [`build_archive`] on a blocking worker
///
/// Tar building is CPU- and I/O-bound and would stall the async runtime.
pub async fn build_archive_blocking(
    out_path: PathBuf,
    root_dir: PathBuf,
    files: Vec<RelativePath>,
) -> Result<FileHash> {
    tokio::task::spawn_blocking(move || build_archive(&out_path, &root_dir, &files))
        .await
        .context("Archive build task panicked")?
}
