//! Persistent local storage for the symmetric key slot.
//!
//! The vault never talks to a global store; a [`KeyValueStore`] is injected at
//! construction so hosts can back it with a file, an OS keychain or an
//! encrypted keystore.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use file::FileKeyValueStore;
pub use memory::{MemoryKeyValueStore, UnavailableKeyValueStore};
pub use traits::KeyValueStore;
