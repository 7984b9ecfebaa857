//! Password hashing.
//!
//! Digests are Argon2id PHC strings. Anything that does not parse as one
//! never verifies.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Digest checked when no record matched, so unknown emails pay the same
/// hashing cost as wrong passwords.
static DECOY_DIGEST: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("decoy-password-never-matches").ok());

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored digest.
///
/// A missing, empty, or unparseable digest is a mismatch.
#[must_use]
pub fn verify_password(password: &str, digest: Option<&str>) -> bool {
    let Some(digest) = digest.filter(|d| !d.is_empty()) else {
        burn_decoy(password);
        return false;
    };
    let Ok(parsed_hash) = PasswordHash::new(digest) else {
        burn_decoy(password);
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Run a verification that always fails.
pub(crate) fn burn_decoy(password: &str) {
    if let Some(decoy) = DECOY_DIGEST.as_deref()
        && let Ok(parsed) = PasswordHash::new(decoy)
    {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let digest = hash_password("p1").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(verify_password("p1", Some(&digest)));
        assert!(!verify_password("p2", Some(&digest)));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("p1").unwrap(), hash_password("p1").unwrap());
    }

    #[test]
    fn test_missing_or_garbage_digest_never_verifies() {
        assert!(!verify_password("p1", None));
        assert!(!verify_password("p1", Some("")));
        assert!(!verify_password("p1", Some("p1")));
        assert!(!verify_password("", Some("not-a-phc-string")));
    }
}
