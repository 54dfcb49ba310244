//! Content checksums for round-trip verification

use sanitext_core::IntegrityVerdict;
use sha2::{Digest, Sha256};

/// Identifier stored in artifacts for the checksum in use
pub const CHECKSUM_ALGORITHM: &str = "sha256";

/// Hex-encoded SHA-256 digest of the text
pub fn checksum(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Compare the stored checksum against the restored text
pub fn verify(expected: &str, restored: &str) -> IntegrityVerdict {
    let actual = checksum(restored);
    IntegrityVerdict {
        passed: actual == expected,
        expected: expected.to_string(),
        actual,
    }
}
