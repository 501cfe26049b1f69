//! Crash-atomic JSON file persistence shared by both stores

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Loads a JSON document, treating a missing file as an empty object.
pub async fn load_json(path: &Path) -> Result<Value> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("Corrupt JSON in {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(Value::Object(serde_json::Map::new()))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Writes a JSON document atomically: temp file in the same directory,
/// fsync, rename.
pub async fn store_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp_path = {
        let mut p = path.as_os_str().to_owned();
        p.push(".tmp");
        std::path::PathBuf::from(p)
    };

    let bytes = serde_json::to_vec_pretty(value).context("Failed to serialise store")?;

    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
    file.write_all(&bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    file.sync_all()
        .await
        .context("Failed to flush store to disk")?;
    drop(file);

    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    debug!(path = %path.display(), bytes = bytes.len(), "store flushed");
    Ok(())
}
