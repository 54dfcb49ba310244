//! Recovery artifact codec
//!
//! Serializes the mapping table and original-content checksum, encrypts the
//! payload with AES-256-GCM under a password-derived key, and persists the
//! result as a JSON artifact. Authentication-tag failures (wrong password,
//! corrupted ciphertext) and structurally invalid artifacts are distinct
//! error classes; callers react differently to each.

use crate::integrity::CHECKSUM_ALGORITHM;
use crate::kdf;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use rand::RngCore;
use chrono::{DateTime, Utc};
use sanitext_core::{Error, MappingEntry, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Current artifact format version
pub const ARTIFACT_VERSION: u32 = 1;

const NONCE_LEN: usize = 12;

/// The encrypted, persisted recovery structure. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryArtifact {
    /// Format version; unknown versions are rejected on load
    pub version: u32,

    /// Base64 key-derivation salt
    pub salt: String,

    /// PBKDF2 iteration count used for this artifact
    pub iterations: u32,

    /// Base64 AES-GCM nonce
    pub nonce: String,

    /// Base64 ciphertext + authentication tag
    pub ciphertext: String,

    /// Checksum algorithm recorded for the original content
    pub checksum_algorithm: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// What actually gets encrypted
#[derive(Debug, Serialize, Deserialize)]
struct RecoveryPayload {
    entries: Vec<MappingEntry>,
    content_checksum: String,
    checksum_algorithm: String,
}

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Encrypt the mapping and checksum into a new artifact
pub fn seal(
    entries: &[MappingEntry],
    content_checksum: &str,
    password: &str,
    iterations: u32,
) -> Result<RecoveryArtifact> {
    let salt = kdf::generate_salt();
    let key = kdf::derive_key(password, &salt, iterations)?;

    let payload = RecoveryPayload {
        entries: entries.to_vec(),
        content_checksum: content_checksum.to_string(),
        checksum_algorithm: CHECKSUM_ALGORITHM.to_string(),
    };
    let plaintext = serde_json::to_vec(&payload)?;

    let cipher = Aes256Gcm::new(&key.into());
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|e| Error::Encryption(format!("cipher setup failed: {}", e)))?;

    info!(
        entries = entries.len(),
        iterations, "recovery artifact sealed"
    );

    Ok(RecoveryArtifact {
        version: ARTIFACT_VERSION,
        salt: b64().encode(salt),
        iterations,
        nonce: b64().encode(nonce_bytes),
        ciphertext: b64().encode(&ciphertext),
        checksum_algorithm: CHECKSUM_ALGORITHM.to_string(),
        created_at: Utc::now(),
    })
}

/// Decrypt an artifact, returning the mapping entries and the stored
/// original-content checksum
pub fn open(artifact: &RecoveryArtifact, password: &str) -> Result<(Vec<MappingEntry>, String)> {
    validate(artifact)?;

    let salt = b64()
        .decode(&artifact.salt)
        .map_err(|e| Error::MalformedArtifact(format!("salt is not valid base64: {}", e)))?;
    let nonce_bytes = b64()
        .decode(&artifact.nonce)
        .map_err(|e| Error::MalformedArtifact(format!("nonce is not valid base64: {}", e)))?;
    let ciphertext = b64()
        .decode(&artifact.ciphertext)
        .map_err(|e| Error::MalformedArtifact(format!("ciphertext is not valid base64: {}", e)))?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(Error::MalformedArtifact(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            nonce_bytes.len()
        )));
    }

    let key = kdf::derive_key(password, &salt, artifact.iterations)?;
    let cipher = Aes256Gcm::new(&key.into());
    let nonce = Nonce::from_slice(&nonce_bytes);

    // Tag failure is indistinguishable between wrong password and a
    // corrupted artifact, and must stay that way.
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_slice())
        .map_err(|_| Error::Decryption)?;

    let payload: RecoveryPayload = serde_json::from_slice(&plaintext)
        .map_err(|e| Error::MalformedArtifact(format!("payload is not valid JSON: {}", e)))?;

    debug!(entries = payload.entries.len(), "recovery artifact opened");
    Ok((payload.entries, payload.content_checksum))
}

/// Structural validation, shared by `open` and artifact loading
pub fn validate(artifact: &RecoveryArtifact) -> Result<()> {
    if artifact.version != ARTIFACT_VERSION {
        return Err(Error::MalformedArtifact(format!(
            "unknown artifact version {}",
            artifact.version
        )));
    }
    if artifact.salt.is_empty() || artifact.nonce.is_empty() || artifact.ciphertext.is_empty() {
        return Err(Error::MalformedArtifact(
            "missing required field".to_string(),
        ));
    }
    Ok(())
}

/// Serialize an artifact for persistence
pub fn to_json(artifact: &RecoveryArtifact) -> Result<String> {
    Ok(serde_json::to_string_pretty(artifact)?)
}

/// Parse a persisted artifact. Parse failures are malformed-artifact errors,
/// never decryption errors.
pub fn from_json(json: &str) -> Result<RecoveryArtifact> {
    let artifact: RecoveryArtifact = serde_json::from_str(json)
        .map_err(|e| Error::MalformedArtifact(format!("unparsable artifact: {}", e)))?;
    validate(&artifact)?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::checksum;
    use sanitext_core::Category;

    const TEST_ITERATIONS: u32 = 1_000;

    fn sample_entries() -> Vec<MappingEntry> {
        vec![MappingEntry {
            original: "alice@example.com".to_string(),
            substitute: "user001@example.com".to_string(),
            category: Category::Email,
            occurrences: 1,
        }]
    }

    #[test]
    fn seal_open_round_trip() {
        let entries = sample_entries();
        let digest = checksum("original text");

        let artifact = seal(&entries, &digest, "hunter2", TEST_ITERATIONS).unwrap();
        let (opened, stored_digest) = open(&artifact, "hunter2").unwrap();

        assert_eq!(opened, entries);
        assert_eq!(stored_digest, digest);
        assert_eq!(artifact.version, ARTIFACT_VERSION);
        assert_eq!(artifact.checksum_algorithm, "sha256");
    }

    #[test]
    fn wrong_password_is_a_decryption_error() {
        let artifact =
            seal(&sample_entries(), &checksum("x"), "hunter2", TEST_ITERATIONS).unwrap();
        let err = open(&artifact, "hunter3").unwrap_err();
        assert!(matches!(err, Error::Decryption));
    }

    #[test]
    fn flipped_ciphertext_byte_is_a_decryption_error() {
        let mut artifact =
            seal(&sample_entries(), &checksum("x"), "hunter2", TEST_ITERATIONS).unwrap();

        let mut raw = b64().decode(&artifact.ciphertext).unwrap();
        raw[0] ^= 0xFF;
        artifact.ciphertext = b64().encode(&raw);

        let err = open(&artifact, "hunter2").unwrap_err();
        assert!(matches!(err, Error::Decryption));
    }

    #[test]
    fn unknown_version_is_malformed() {
        let mut artifact =
            seal(&sample_entries(), &checksum("x"), "hunter2", TEST_ITERATIONS).unwrap();
        artifact.version = 99;

        let err = open(&artifact, "hunter2").unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact(_)));
    }

    #[test]
    fn garbage_base64_is_malformed_not_decryption() {
        let mut artifact =
            seal(&sample_entries(), &checksum("x"), "hunter2", TEST_ITERATIONS).unwrap();
        artifact.nonce = "not base64 at all!".to_string();

        let err = open(&artifact, "hunter2").unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact(_)));
    }

    #[test]
    fn unparsable_json_is_malformed() {
        let err = from_json("{ this is not json").unwrap_err();
        assert!(matches!(err, Error::MalformedArtifact(_)));
    }

    #[test]
    fn json_persistence_round_trip() {
        let artifact =
            seal(&sample_entries(), &checksum("x"), "hunter2", TEST_ITERATIONS).unwrap();
        let json = to_json(&artifact).unwrap();
        let loaded = from_json(&json).unwrap();

        let (entries, _) = open(&loaded, "hunter2").unwrap();
        assert_eq!(entries, sample_entries());
    }

    #[test]
    fn empty_password_is_an_encryption_error() {
        let err = seal(&sample_entries(), &checksum("x"), "", TEST_ITERATIONS).unwrap_err();
        assert!(matches!(err, Error::Encryption(_)));
    }

    #[test]
    fn empty_mapping_seals_and_opens() {
        let artifact = seal(&[], &checksum(""), "hunter2", TEST_ITERATIONS).unwrap();
        let (entries, digest) = open(&artifact, "hunter2").unwrap();
        assert!(entries.is_empty());
        assert_eq!(digest, checksum(""));
    }
}
