//! Credential hashing and verification.
//!
//! Passwords are stored as Argon2id PHC strings and never compared in
//! plaintext.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use thiserror::Error;

/// Errors during credential hashing or verification.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Stored credential is not a valid PHC string")]
    InvalidStoredHash,
}

/// Hash a plaintext password into an Argon2id PHC string.
///
/// A fresh random salt is generated per call, so hashing the same
/// password twice yields different strings.
///
/// # Errors
/// Returns error if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only an unparseable stored hash is an
/// error (it means the stored data is corrupt, not that the caller
/// supplied a wrong password).
///
/// # Errors
/// Returns [`CredentialError::InvalidStoredHash`] if the stored value
/// cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| CredentialError::InvalidStoredHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
