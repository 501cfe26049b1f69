//! CampusDrive API - Signed HTTP access to the course server
//!
//! Provides:
//! - [`ApiClient`], a typed client implementing the [`IProjectApi`] port
//! - [`PemSigner`], the JWT-signing capability backed by the client's
//!   private key file
//!
//! [`IProjectApi`]: campusdrive_core::ports::IProjectApi

pub mod client;
pub mod signer;

pub use client::ApiClient;
pub use signer::PemSigner;
