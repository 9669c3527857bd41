//! User credential Redis operations.
//!
//! Redis key pattern:
//! - `{username}` — argon2id PHC hash (STRING, no TTL)

use super::{check_username, CredentialHasher, CredentialStore, StoreError};
use async_trait::async_trait;
use redis::AsyncCommands;

/// Store a password hash for `username` (permanent, no TTL).
///
/// Overwrites any existing record.
pub async fn set_password_hash<C>(
    con: &mut C,
    username: &str,
    hash: &str,
) -> Result<(), redis::RedisError>
where
    C: AsyncCommands,
{
    con.set::<_, _, ()>(username, hash).await
}

/// Get the password hash stored for `username`.
pub async fn get_password_hash<C>(
    con: &mut C,
    username: &str,
) -> Result<Option<String>, redis::RedisError>
where
    C: AsyncCommands,
{
    con.get(username).await
}

/// Delete the record for `username`.
///
/// Returns true if a record was deleted, false if it didn't exist.
pub async fn delete_user<C>(con: &mut C, username: &str) -> Result<bool, redis::RedisError>
where
    C: AsyncCommands,
{
    let deleted: i32 = con.del(username).await?;
    Ok(deleted > 0)
}

/// Credential store persisting one key per user in Redis.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: redis::Client,
    hasher: CredentialHasher,
}

impl RedisStore {
    pub fn new(client: redis::Client, hasher: CredentialHasher) -> Self {
        RedisStore { client, hasher }
    }

    pub fn open(redis_url: &str, hasher: CredentialHasher) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self::new(client, hasher))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Backend(format!("Redis connection error: {}", e)))
    }

    /// Remove the record for `username`, returning whether one existed.
    pub async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let mut con = self.connection().await?;
        Ok(delete_user(&mut con, username).await?)
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn validate(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let mut con = self.connection().await?;
        let stored = get_password_hash(&mut con, username).await?;

        if stored.is_none() {
            tracing::debug!("Unknown user");
        }

        self.hasher.verify_blocking(password, stored).await
    }

    async fn insert_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        check_username(username)?;
        let hash = self.hasher.hash_blocking(password).await?;

        let mut con = self.connection().await?;
        set_password_hash(&mut con, username, &hash).await?;
        Ok(())
    }
}
