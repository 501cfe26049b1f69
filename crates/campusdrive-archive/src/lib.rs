//! CampusDrive Archive - Upload archive construction
//!
//! Provides:
//! - A reproducible brotli-compressed tar builder for upload payloads
//! - Tee-hashing of the compressed stream, so the digest the server
//!   verifies is computed in the same pass as the file write

pub mod builder;
mod tee;

pub use builder::{build_archive, build_archive_blocking};
