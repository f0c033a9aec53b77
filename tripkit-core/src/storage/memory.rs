//! In-process storage backends.

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::{StorageError, StorageResult};
use super::traits::KeyValueStore;

/// Process-memory key/value store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites `slot` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn set(&self, slot: &str, value: &str) -> StorageResult<()> {
        self.slots
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(slot.to_string(), value.to_string());
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, slot: &str) -> StorageResult<Option<String>> {
        let guard = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.get(slot).cloned())
    }

    fn insert_if_absent(&self, slot: &str, value: &str) -> StorageResult<String> {
        let mut guard = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(guard
            .entry(slot.to_string())
            .or_insert_with(|| value.to_string())
            .clone())
    }

    fn remove(&self, slot: &str) -> StorageResult<()> {
        self.slots
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .remove(slot);
        Ok(())
    }
}

/// Store for execution contexts without any persistent medium.
///
/// Every call fails with [`StorageError::Unavailable`], so a vault built on it
/// refuses to run instead of falling back to an ephemeral key.
#[derive(Debug, Clone)]
pub struct UnavailableKeyValueStore {
    reason: String,
}

impl UnavailableKeyValueStore {
    /// Creates a store that reports `reason` on every access.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl KeyValueStore for UnavailableKeyValueStore {
    fn get(&self, _slot: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn insert_if_absent(&self, _slot: &str, _value: &str) -> StorageResult<String> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn remove(&self, _slot: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }
}
