//! Adapter layer modules for external system integration.
//!
//! Provides adapters for:
//! - The cryptographic engine contract used by the domain and services
//! - OpenSSL-backed digests, signatures and key handling

pub mod engine;
pub mod openssl;

pub use engine::{default_engine, CryptoEngine};
pub use openssl::OpensslEngine;
