//! Password value object - hashing, verification and reset fingerprints.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Hash verified when a login names an unknown email, so the response time
/// does not reveal whether the account exists.
pub(crate) const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2$8n2hG7WlGvqz3cXkXQn8m8kqk3yFJmYw8lU6CqXl5Yw";

/// Password value object that handles hashing and verification.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(..)")
    }
}

impl Password {
    /// Validate and hash a plain text password.
    ///
    /// # Errors
    /// Returns `InvalidPassword` if the password is too short.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        Self::validate(plain_text)?;
        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Check password rules without hashing.
    pub fn validate(plain_text: &str) -> AppResult<()> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_password(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    /// Create a Password from an existing hash (from database).
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        Self::verify_hash(plain_text, &self.hash).unwrap_or(false)
    }

    /// Derive a fingerprint of the current hash.
    ///
    /// Reset tokens embed it; once the password changes the stored hash
    /// changes too and old fingerprints stop matching.
    pub fn fingerprint(&self) -> AppResult<String> {
        Self::hash(&self.hash)
    }

    /// Check a fingerprint produced by [`Password::fingerprint`].
    pub fn matches_fingerprint(&self, fingerprint: &str) -> bool {
        Self::verify_hash(&self.hash, fingerprint).unwrap_or(false)
    }

    fn hash(plain_text: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_hash(plain_text: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;
        Ok(Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}
