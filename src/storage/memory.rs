//! In-process credential store.

use super::{check_username, CredentialHasher, CredentialStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Credential store backed by a `HashMap` of username to argon2 hash.
///
/// Records live only as long as the process.
#[derive(Debug)]
pub struct MemoryStore {
    hasher: CredentialHasher,
    users: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new(hasher: CredentialHasher) -> Self {
        MemoryStore {
            hasher,
            users: RwLock::new(HashMap::new()),
        }
    }

    fn stored_hash(&self, username: &str) -> Result<Option<String>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Backend("user map lock poisoned".to_string()))?;
        Ok(users.get(username).cloned())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn validate(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let stored = self.stored_hash(username)?;
        self.hasher.verify_blocking(password, stored).await
    }

    async fn insert_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        check_username(username)?;
        let hash = self.hasher.hash_blocking(password).await?;

        self.users
            .write()
            .map_err(|_| StoreError::Backend("user map lock poisoned".to_string()))?
            .insert(username.to_string(), hash);
        Ok(())
    }
}
