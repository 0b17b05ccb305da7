//! Password hashing with argon2id.
//!
//! Stored digests are PHC strings, so the salt and parameters travel with the
//! hash and verification stays constant-time.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Derive a one-way digest for storage.
pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {e}"))?;

    Ok(digest.to_string())
}

/// Verify a plaintext password against a stored PHC digest.
///
/// An unparsable digest counts as a mismatch rather than an error.
pub(super) fn verify_password(password: &str, digest: &str) -> bool {
    PasswordHash::new(digest).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let digest = hash_password("pw123").unwrap();
        assert!(verify_password("pw123", &digest));
    }

    #[test]
    fn wrong_password_rejected() {
        let digest = hash_password("pw123").unwrap();
        assert!(!verify_password("pw124", &digest));
    }

    #[test]
    fn malformed_digest_rejected() {
        assert!(!verify_password("pw123", "not-a-phc-string"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let first = hash_password("pw123").unwrap();
        let second = hash_password("pw123").unwrap();
        assert_ne!(first, second);
    }
}
