//! Credential hashing with Argon2id.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid Argon2 params: {0}")]
    Params(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Password hashing task failed: {0}")]
    Task(String),
}

/// Hashes and verifies passwords with a fixed Argon2id work factor.
///
/// Every hash embeds a fresh random salt, so hashing the same password twice
/// yields different strings that both verify.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| PasswordError::Params(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Returns `true` only on an exact match. A malformed stored hash counts
    /// as a mismatch.
    #[must_use]
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash could not be parsed");
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Hash on the blocking pool; Argon2 is CPU-bound and would stall the runtime.
    pub async fn hash_async(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    pub async fn verify_async(&self, hash: String, password: String) -> bool {
        let hasher = self.clone();
        match task::spawn_blocking(move || hasher.verify(&hash, &password)).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("Password verification task failed: {e}");
                false
            }
        }
    }
}
