//! Signet SDK
//!
//! Shared wire types for the Signet ingestion service, the canonical payload
//! encoding every checksum is computed over, and (behind the `client`
//! feature) a typed HTTP client.

pub mod canonical;
#[cfg(feature = "client")]
pub mod client;
pub mod objects;
