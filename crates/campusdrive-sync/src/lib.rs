//! CampusDrive Sync - The project synchronisation engine
//!
//! Provides:
//! - Filesystem primitives (tree scanning, streaming hashes, atomic
//!   permission-aware writes)
//! - The [`SyncEngine`] orchestrating one transactional sync run
//! - Project removal
//!
//! [`SyncEngine`]: engine::SyncEngine

pub mod engine;
pub mod fsops;

pub use engine::{ForceMode, SyncEngine, SyncOutcome, SyncRun};
