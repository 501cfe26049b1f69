//! Project metadata store port (driven/secondary port)
//!
//! Defines the interface for the durable `ProjectId -> Project` mapping.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   and don't need domain-level classification.
//! - `upsert` must be crash-atomic: after a crash the store contains
//!   either the previous or the new record, never a torn mix. The
//!   synchronisation engine relies on this to keep baselines intact when
//!   a run fails mid-way.

use crate::domain::newtypes::ProjectId;
use crate::domain::project::Project;

/// Port trait for persistent project storage
#[async_trait::async_trait]
pub trait IMetadataStore: Send + Sync {
    /// Retrieves a project by its identifier
    async fn find(&self, id: &ProjectId) -> anyhow::Result<Option<Project>>;

    /// Retrieves every known project
    async fn find_all(&self) -> anyhow::Result<Vec<Project>>;

    /// Inserts or replaces a project record atomically
    async fn upsert(&self, project: &Project) -> anyhow::Result<()>;

    /// Removes a project record; removing an unknown id is not an error
    async fn remove(&self, id: &ProjectId) -> anyhow::Result<()>;
}
