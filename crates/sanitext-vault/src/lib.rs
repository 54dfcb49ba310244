//! Sanitext Vault
//!
//! Encrypted recovery for sanitized text:
//! - Password-based key derivation (PBKDF2-HMAC-SHA256)
//! - Authenticated encryption of the recovery mapping (AES-256-GCM)
//! - Content checksums for round-trip verification

pub mod codec;
pub mod integrity;
pub mod kdf;

pub use codec::{RecoveryArtifact, ARTIFACT_VERSION};
pub use kdf::DEFAULT_ITERATIONS;
