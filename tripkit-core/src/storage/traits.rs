//! Platform interface for the persisted key slot.

use super::error::StorageResult;

/// String key/value store holding long-lived local secrets.
///
/// Implementations must make [`KeyValueStore::insert_if_absent`] atomic with
/// respect to other writers of the same slot: when two callers race to
/// initialize a slot, exactly one value is persisted and both callers observe
/// it.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `slot`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, slot: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `slot` unless the slot is already populated.
    ///
    /// Returns the value held by the slot after the call: `value` if this call
    /// won, or the previously stored value otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or written.
    fn insert_if_absent(&self, slot: &str, value: &str) -> StorageResult<String>;

    /// Removes `slot`. Removing a missing slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, slot: &str) -> StorageResult<()>;
}
