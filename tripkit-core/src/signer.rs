//! The wallet capability that approves disclosure statements.

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use thiserror::Error;

use crate::authorization::DisclosureStatement;

/// Failure returned by a [`Signer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The account holder refused to sign.
    #[error("signer declined the request")]
    Declined,
    /// The signer could not produce a signature.
    #[error("signer failure: {0}")]
    Failed(String),
}

/// An account able to sign typed disclosure statements.
///
/// Signing usually waits on interactive approval and may stay pending for an
/// arbitrary time. The core applies no timeout; callers abandon the request by
/// dropping the future.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Address of the signing account.
    fn address(&self) -> Address;

    /// Signs the EIP-712 digest of `statement`, returning the 65-byte signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Declined`] when the holder refuses and
    /// [`SignerError::Failed`] for any other failure.
    async fn sign_disclosure(&self, statement: &DisclosureStatement) -> Result<Bytes, SignerError>;
}
