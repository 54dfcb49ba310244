//! Error types for Sanitext Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Pattern error: {0}")]
    Pattern(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Authenticated decryption failed: wrong password or corrupted
    /// ciphertext. Callers may retry with a different password.
    #[error("Decryption failed: wrong password or corrupted artifact")]
    Decryption,

    /// The artifact is structurally invalid. Retrying the password will not
    /// help; the artifact itself is unusable.
    #[error("Malformed recovery artifact: {0}")]
    MalformedArtifact(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Operation timed out after {0}s")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
