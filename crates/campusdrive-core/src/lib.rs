//! CampusDrive Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - Domain entities (Project, FileInfo, change records, SyncState)
//! - Validated newtypes (ProjectId, RelativePath, FileHash)
//! - Port definitions (traits for adapters)
//! - The synchronisation error taxonomy

pub mod config;
pub mod domain;
pub mod ports;
