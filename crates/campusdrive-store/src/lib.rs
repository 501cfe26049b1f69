//! CampusDrive Store - Durable client-side state
//!
//! Provides:
//! - The project metadata store (`project_metadata.json`)
//! - The settings store (`settings.json`)
//!
//! Both stores are JSON files flushed on every write. Writes go to a
//! temporary file in the same directory, are fsynced, and then renamed over
//! the target, so a crash leaves either the old or the new state on disk.

pub mod repository;
pub mod settings;

mod atomic;

pub use repository::MetadataStore;
pub use settings::SettingsStore;
