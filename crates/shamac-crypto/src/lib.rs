//! SHA-256 and HMAC-SHA256 for shamac.
//!
//! All implementations are from scratch.
//! Reference crates (sha2, hmac) are dev-dependencies only.

#![forbid(unsafe_code)]

pub mod hmac;
pub mod sha256;

pub use shamac_core::{Digest, Error, Result};
