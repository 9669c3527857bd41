//! Argon2id password hashing.
//!
//! Hashing is CPU-bound and deliberately slow, so the async entry points run
//! it on tokio's blocking pool. Each run holds a permit for its whole
//! duration, capping how many hashes (and their memory) are live at once.

use super::StoreError;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// OWASP recommended argon2id parameters: m=19456 (19 MiB), t=2, p=1.
pub const DEFAULT_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Hashes allowed to run at once (about 19 MiB each at the defaults).
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

const SALT_LEN: usize = 16;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-users";

/// Hashes and verifies passwords with a fixed argon2id configuration.
///
/// Holds a decoy hash so that checks for unknown users cost the same as
/// checks for known ones.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy: Arc<str>,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", self.argon2.params())
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

impl CredentialHasher {
    /// `max_concurrent` bounds how many hashes the blocking-pool entry
    /// points run at once; callers beyond it wait for a permit.
    pub fn new(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        max_concurrent: usize,
    ) -> Result<Self, StoreError> {
        if max_concurrent == 0 {
            return Err(StoreError::Hashing(
                "max concurrent hashes must be greater than 0".to_string(),
            ));
        }

        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| StoreError::Hashing(format!("Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy = hash_with(&argon2, DECOY_PASSWORD)?;

        Ok(CredentialHasher {
            argon2,
            decoy: decoy.into(),
            permits: Arc::new(Semaphore::new(max_concurrent)),
        })
    }

    /// Produce a salted PHC hash string for `password`.
    pub fn hash(&self, password: &str) -> Result<String, StoreError> {
        hash_with(&self.argon2, password)
    }

    /// Check `password` against `stored`, or against the decoy when there is
    /// no stored hash. Unparseable hashes never match.
    pub fn verify(&self, password: &str, stored: Option<&str>) -> bool {
        let (hash, known) = match stored {
            Some(hash) => (hash, true),
            None => (&*self.decoy, false),
        };

        let matched = match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
                false
            }
        };

        known && matched
    }

    /// Wait for a hashing slot. The permit must travel into the blocking
    /// task so it is released only when argon2 finishes, even if the caller
    /// has given up by then.
    pub(crate) async fn permit(&self) -> Result<OwnedSemaphorePermit, StoreError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StoreError::Hashing(format!("Hasher closed: {}", e)))
    }

    /// [`CredentialHasher::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, password: &str) -> Result<String, StoreError> {
        let permit = self.permit().await?;
        let hasher = self.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            hasher.hash(&password)
        })
        .await
        .map_err(|e| StoreError::Hashing(format!("Task join error: {}", e)))?
    }

    /// [`CredentialHasher::verify`] on the blocking pool.
    pub async fn verify_blocking(
        &self,
        password: &str,
        stored: Option<String>,
    ) -> Result<bool, StoreError> {
        let permit = self.permit().await?;
        let hasher = self.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            hasher.verify(&password, stored.as_deref())
        })
        .await
        .map_err(|e| StoreError::Hashing(format!("Task join error: {}", e)))
    }
}

fn hash_with(argon2: &Argon2<'static>, password: &str) -> Result<String, StoreError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| StoreError::Hashing(format!("Salt encoding: {}", e)))?;

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Hashing(e.to_string()))
}

/// Cheap parameters so tests don't spend seconds per hash.
#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(1024, 1, 1, DEFAULT_MAX_CONCURRENT).unwrap()
}
