use thiserror::Error;

use crate::gateway::GatewayError;
use crate::ledger::LedgerError;
use crate::storage::StorageError;

/// Error outputs from `TripKit`
#[derive(Debug, Error)]
pub enum TripKitError {
    /// No usable persistent medium for the symmetric key in this execution context.
    #[error("environment_error: {0}")]
    Environment(String),
    /// A sealed envelope (or a stored key) is malformed or uses an unknown version.
    #[error("format_error: {0}")]
    Format(String),
    /// The payload could not be serialized, or the decrypted bytes do not parse.
    #[error("serialization_error: {0}")]
    Serialization(String),
    /// The AEAD integrity check failed. Never a "wrong key, try again" signal.
    #[error("authentication_error")]
    Authentication,
    /// The presented input is not valid for the requested operation
    #[error("invalid_argument: {attribute}: {reason}")]
    InvalidArgument {
        /// The attribute that was invalid.
        attribute: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The relay kept failing with transient errors until the retry budget ran out.
    #[error("relay_unavailable: relayer temporarily unavailable")]
    RelayUnavailable,
    /// The signer refused to sign the disclosure statement.
    #[error("authorization_declined")]
    AuthorizationDeclined,
    /// Unclassified gateway failure, surfaced verbatim.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The signer failed for a reason other than an explicit refusal.
    #[error("signer_error: {0}")]
    Signer(String),
    /// Failure reported by the ledger collaborator.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl TripKitError {
    pub(crate) fn invalid_argument(
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for TripKitError {
    fn from(error: StorageError) -> Self {
        Self::Environment(error.to_string())
    }
}

/// Result alias used across `tripkit-core`.
pub type TripKitResult<T, E = TripKitError> = std::result::Result<T, E>;
