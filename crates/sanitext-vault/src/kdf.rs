//! Password-based key derivation
//!
//! PBKDF2-HMAC-SHA256 with a per-operation random salt. Deliberately slow;
//! the iteration count is the only tunable. Deterministic for a given
//! (password, salt, iterations) triple — a wrong password is not detectable
//! here, it simply produces a key that fails authenticated decryption.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sanitext_core::{Error, Result};
use sha2::Sha256;

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Derived key length (AES-256)
pub const KEY_LEN: usize = 32;

/// Salt length in bytes
pub const SALT_LEN: usize = 32;

/// Derive a symmetric key from a password and salt
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Result<[u8; KEY_LEN]> {
    if password.is_empty() {
        return Err(Error::Encryption("password must not be empty".to_string()));
    }
    if salt.is_empty() {
        return Err(Error::Encryption("salt must not be empty".to_string()));
    }
    if iterations == 0 {
        return Err(Error::Encryption(
            "iteration count must be positive".to_string(),
        ));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    Ok(key)
}

/// Fresh random salt for one sanitize operation
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key("hunter2", &salt, 1_000).unwrap();
        let b = derive_key("hunter2", &salt, 1_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_give_different_keys() {
        let salt = [7u8; SALT_LEN];
        let base = derive_key("hunter2", &salt, 1_000).unwrap();

        assert_ne!(base, derive_key("hunter3", &salt, 1_000).unwrap());
        assert_ne!(base, derive_key("hunter2", &[8u8; SALT_LEN], 1_000).unwrap());
        assert_ne!(base, derive_key("hunter2", &salt, 2_000).unwrap());
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = derive_key("", &[7u8; SALT_LEN], 1_000).unwrap_err();
        assert!(matches!(err, Error::Encryption(_)));
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
