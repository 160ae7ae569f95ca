//! Bearer token and session keys kept in a `KeyValueStore`.
//!
//! No expiry, refresh or format validation: a token is whatever string the
//! login flow saved.

use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "jwtToken";
pub const CURRENT_USER_KEY: &str = "currentUser";
pub const GROUP_PERMISSIONS_KEY: &str = "group_permissions";
pub const ENABLE_PERMISSIONS_KEY: &str = "enable_permissions";

/// Handle to the token and session entries. Clones share the same store.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn get_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(TOKEN_KEY)
    }

    /// Token suitable for an `Authorization` header: present and non-empty.
    pub fn bearer_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.get_token()?.filter(|token| !token.is_empty()))
    }

    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, token)
    }

    pub fn destroy_token(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)
    }

    /// Removes the token and the current user.
    ///
    /// The permission entries are left in place; `destroy_user` is the only
    /// call that removes them.
    pub fn destroy_all(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(CURRENT_USER_KEY)
    }

    /// Removes the current user and both permission entries. The token stays.
    pub fn destroy_user(&self) -> Result<(), StorageError> {
        self.storage.remove(CURRENT_USER_KEY)?;
        self.storage.remove(GROUP_PERMISSIONS_KEY)?;
        self.storage.remove(ENABLE_PERMISSIONS_KEY)
    }

    /// Clears the whole store, not just the keys managed here.
    pub fn clean_local_storage(&self) -> Result<(), StorageError> {
        self.storage.clear()
    }

    pub fn current_user(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(CURRENT_USER_KEY)
    }

    pub fn save_current_user(&self, user: &str) -> Result<(), StorageError> {
        self.storage.set(CURRENT_USER_KEY, user)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
