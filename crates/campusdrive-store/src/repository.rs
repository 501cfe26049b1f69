//! Project metadata store (secondary/driven adapter)
//!
//! Implements [`IMetadataStore`] over a single JSON file mapping project ids
//! to project records (`project_metadata.json`). The whole document is
//! loaded per operation, giving readers a consistent snapshot; writes are
//! serialised through an internal mutex and flushed atomically.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use campusdrive_core::domain::{Project, ProjectId};
use campusdrive_core::ports::IMetadataStore;

use crate::atomic::{load_json, store_json};

/// File-backed `ProjectId -> Project` mapping
pub struct MetadataStore {
    /// Location of `project_metadata.json`
    path: PathBuf,
    /// Serialises writers; readers only take consistent point-in-time
    /// snapshots and need no coordination
    write_lock: Mutex<()>,
}

impl MetadataStore {
    /// Creates a store over the given file path.
    ///
    /// The file is created lazily on the first write; a missing file reads
    /// as an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Conventional location below the app data directory.
    pub fn default_in(data_dir: &std::path::Path) -> Self {
        Self::new(data_dir.join("project_metadata.json"))
    }

    async fn load_map(&self) -> Result<BTreeMap<String, Project>> {
        let value = load_json(&self.path).await?;
        serde_json::from_value(value)
            .with_context(|| format!("Corrupt project metadata in {}", self.path.display()))
    }

    async fn store_map(&self, map: &BTreeMap<String, Project>) -> Result<()> {
        let value = serde_json::to_value(map).context("Failed to serialise project metadata")?;
        store_json(&self.path, &value).await
    }
}

#[async_trait::async_trait]
impl IMetadataStore for MetadataStore {
    #[instrument(skip(self), fields(id = %id))]
    async fn find(&self, id: &ProjectId) -> Result<Option<Project>> {
        let map = self.load_map().await?;
        Ok(map.get(id.as_str()).cloned())
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Project>> {
        let map = self.load_map().await?;
        Ok(map.into_values().collect())
    }

    #[instrument(skip(self, project), fields(id = %project.id()))]
    async fn upsert(&self, project: &Project) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load_map().await?;
        map.insert(project.id().as_str().to_string(), project.clone());
        self.store_map(&map).await?;

        debug!("project record upserted");
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn remove(&self, id: &ProjectId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load_map().await?;
        if map.remove(id.as_str()).is_some() {
            self.store_map(&map).await?;
            debug!("project record removed");
        }
        Ok(())
    }
}
