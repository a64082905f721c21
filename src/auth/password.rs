use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::HashingConfig;

/// Argon2id hasher with a configurable work factor. Output is a PHC string
/// carrying its own salt and parameters.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(cfg: HashingConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes on the blocking pool; the work factor makes this slow on purpose.
    pub async fn hash(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_sync(&plain))
            .await
            .context("hash task panicked")?
    }

    pub async fn verify(&self, plain: String, digest: String) -> anyhow::Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_sync(&plain, &digest))
            .await
            .context("verify task panicked")?
    }

    /// True when `digest` was produced with other parameters than the current ones.
    pub fn needs_rehash(&self, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        let Ok(stored) = Params::try_from(&parsed) else {
            return true;
        };
        let current = self.argon2.params();
        stored.m_cost() != current.m_cost()
            || stored.t_cost() != current.t_cost()
            || stored.p_cost() != current.p_cost()
    }

    fn hash_sync(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    fn verify_sync(&self, plain: &str, digest: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(digest).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        // Parameters come from the digest itself, so old hashes still verify.
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}
