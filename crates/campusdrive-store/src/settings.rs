//! Settings store (secondary/driven adapter)
//!
//! Implements [`ISettingsStore`] over `settings.json`, a flat string-to-
//! string map. The host shell owns most keys (tokens, client id); the sync
//! core only reads `projectDir`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::instrument;

use campusdrive_core::ports::ISettingsStore;

use crate::atomic::{load_json, store_json};

/// File-backed key-value settings
pub struct SettingsStore {
    /// Location of `settings.json`
    path: PathBuf,
    /// Serialises writers
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// Creates a store over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Conventional location below the app data directory.
    pub fn default_in(data_dir: &std::path::Path) -> Self {
        Self::new(data_dir.join("settings.json"))
    }

    async fn load_map(&self) -> Result<BTreeMap<String, String>> {
        let value = load_json(&self.path).await?;
        serde_json::from_value(value)
            .with_context(|| format!("Corrupt settings in {}", self.path.display()))
    }
}

#[async_trait::async_trait]
impl ISettingsStore for SettingsStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.load_map().await?;
        Ok(map.get(key).cloned())
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load_map().await?;
        map.insert(key.to_string(), value.to_string());
        let value = serde_json::to_value(&map).context("Failed to serialise settings")?;
        store_json(&self.path, &value).await
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load_map().await?;
        if map.remove(key).is_some() {
            let value = serde_json::to_value(&map).context("Failed to serialise settings")?;
            store_json(&self.path, &value).await?;
        }
        Ok(())
    }
}
