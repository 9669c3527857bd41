//! Credential storage.
//!
//! [`CredentialStore`] is the contract the login handler depends on. Two
//! implementations are provided and chosen at startup:
//! - [`MemoryStore`]: process-local map, used for tests and development
//! - [`RedisStore`]: one `username -> argon2 hash` key per user
//!
//! Plaintext passwords are never persisted; only PHC-formatted argon2id
//! hashes are stored.

pub mod memory;
pub mod password;
pub mod user;

pub use memory::MemoryStore;
pub use password::CredentialHasher;
pub use user::RedisStore;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(&'static str),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(format!("Redis error: {}", err))
    }
}

/// Username/password verification backed by stored hashes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Check a username/password pair.
    ///
    /// Returns `Ok(false)` both for an unknown username and for a wrong
    /// password; callers cannot tell the two apart. `Err` means the store
    /// itself failed and says nothing about the credentials.
    async fn validate(&self, username: &str, password: &str) -> Result<bool, StoreError>;

    /// Hash `password` and store it for `username`, replacing any existing
    /// record.
    async fn insert_user(&self, username: &str, password: &str) -> Result<(), StoreError>;
}

pub(crate) fn check_username(username: &str) -> Result<(), StoreError> {
    if username.is_empty() {
        return Err(StoreError::InvalidUsername("cannot be empty"));
    }
    Ok(())
}
