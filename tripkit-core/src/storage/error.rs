//! Error types for local key/value storage.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by key/value storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// There is no persistent medium in the current execution context.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// I/O failure while reading or writing a slot.
    #[error("storage io error ({context}): {source}")]
    Io {
        /// What was being done when the failure happened.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The slot name cannot be represented by this backend.
    #[error("invalid slot name: {0}")]
    InvalidSlot(String),

    /// A lock protecting the backend was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
