use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::HashConfig;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("hashing worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Argon2id hasher with the configured work factor.
///
/// Hashing is deliberately slow, so the async entry points run on the
/// blocking pool instead of the request executor.
#[derive(Clone)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    pub fn new(cfg: &HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.work_factor, 1, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash_blocking(&self, plain: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                HashError::Hash(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` is a mismatch; `Err` means the stored hash could not be used at all.
    pub fn verify_blocking(&self, plain: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            HashError::MalformedHash(e.to_string())
        })?;
        // Cost parameters come from the PHC string, so hashes made under an
        // older work factor still verify.
        Ok(self
            .argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    pub async fn hash(&self, plain: String) -> Result<String, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&plain)).await?
    }

    pub async fn verify(&self, plain: String, hash: String) -> Result<bool, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(&plain, &hash)).await?
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> Hasher {
    Hasher::new(&HashConfig {
        work_factor: 1,
        memory_kib: 256,
    })
    .expect("cheap argon2 params")
}
