//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IProjectApi`] - Signed HTTP operations against the course server
//! - [`ISigner`] - The JWT-signing capability bound to the client key
//! - [`IMetadataStore`] - Durable `ProjectId -> Project` mapping
//! - [`ISettingsStore`] - Opaque key-value settings storage

pub mod metadata_store;
pub mod project_api;
pub mod settings;
pub mod signer;

pub use metadata_store::IMetadataStore;
pub use project_api::{
    AccessStatus, ApiError, ClientRegistration, ClientToken, IProjectApi, ProjectArchive,
    ProjectInventory, RegisteredClient,
};
pub use settings::{keys, ISettingsStore};
pub use signer::{ISigner, SignError};
