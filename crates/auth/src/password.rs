//! Credential hashing capability.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash/verify capability for stored credentials.
pub trait CredentialHasher: Send + Sync {
    /// Produce a storable hash of `plaintext`.
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

/// Argon2id with a random per-password salt, PHC string output.
#[derive(Default, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl core::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Argon2Hasher")
    }
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| HashError::Hash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Hash(e.to_string())),
        }
    }
}

/// Deterministic fake: stores `plain$<password>`. Tests only.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextHasher;

#[cfg(any(test, feature = "test-util"))]
impl CredentialHasher for PlaintextHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(format!("plain${plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let stored = hash
            .strip_prefix("plain$")
            .ok_or_else(|| HashError::MalformedHash("missing plain$ prefix".to_string()))?;
        Ok(stored == plaintext)
    }
}
