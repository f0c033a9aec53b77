//! Session-scoped cache of decryption authorizations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::storage::{StorageError, StorageResult};

use super::{AuthorizationCacheKey, DecryptionAuthorization};

/// Where issued authorizations are kept between reveal requests.
///
/// Entries are shared as `Arc`s and replaced whole, so a reader racing a
/// writer observes either the previous or the new authorization, never a mix.
/// The lifetime of the store is decided by the caller.
pub trait SessionStore: Send + Sync {
    /// Looks up the authorization cached under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(
        &self,
        key: &AuthorizationCacheKey,
    ) -> StorageResult<Option<Arc<DecryptionAuthorization>>>;

    /// Caches `authorization` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(
        &self,
        key: AuthorizationCacheKey,
        authorization: Arc<DecryptionAuthorization>,
    ) -> StorageResult<()>;
}

/// Process-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<AuthorizationCacheKey, Arc<DecryptionAuthorization>>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached authorizations.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.entries.read().map_err(|_| StorageError::Poisoned)?.len())
    }

    /// Whether the store holds no authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(
        &self,
        key: &AuthorizationCacheKey,
    ) -> StorageResult<Option<Arc<DecryptionAuthorization>>> {
        let guard = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(
        &self,
        key: AuthorizationCacheKey,
        authorization: Arc<DecryptionAuthorization>,
    ) -> StorageResult<()> {
        self.entries
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key, authorization);
        Ok(())
    }
}
