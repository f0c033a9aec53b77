//! Contract of the remote homomorphic-encryption gateway.
//!
//! The gateway (relayer plus decryption service) performs all FHE
//! cryptography; this crate only drives it. Failures are reported with a
//! structured [`GatewayErrorKind`] so callers never have to classify errors by
//! matching message text:
//!
//! | kind                 | retryable |
//! |----------------------|-----------|
//! | `RelayUnavailable`   | yes       |
//! | `MalformedResponse`  | yes       |
//! | `Network`            | yes       |
//! | `Timeout`            | yes       |
//! | `Rejected`           | no        |
//! | `Unauthorized`       | no        |
//! | `InvalidRequest`     | no        |
//! | `Internal`           | no        |

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use secrecy::SecretString;
use strum::Display;
use thiserror::Error;

use crate::authorization::DecryptionAuthorization;

/// Opaque reference to a homomorphically-encrypted value.
pub type Handle = B256;

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure categories a gateway implementation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GatewayErrorKind {
    /// The relay explicitly reported it is temporarily unavailable.
    RelayUnavailable,
    /// The relay answered with a body that could not be understood.
    MalformedResponse,
    /// Connection-level failure reaching the relay.
    Network,
    /// The relay did not answer in time.
    Timeout,
    /// The relay understood the request and refused it.
    Rejected,
    /// The authorization presented does not cover the request.
    Unauthorized,
    /// The request itself was invalid.
    InvalidRequest,
    /// Any other failure inside the gateway client.
    Internal,
}

impl GatewayErrorKind {
    /// Whether a call failing with this kind may succeed if repeated.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RelayUnavailable | Self::MalformedResponse | Self::Network | Self::Timeout
        )
    }
}

/// Error reported by a [`CryptoGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("gateway error ({kind}): {message}")]
pub struct GatewayError {
    kind: GatewayErrorKind,
    message: String,
}

impl GatewayError {
    /// Creates an error of `kind` with a human-readable `message`.
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The structured failure category.
    #[must_use]
    pub const fn kind(&self) -> GatewayErrorKind {
        self.kind
    }

    /// The message reported by the gateway.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for `self.kind().is_retryable()`.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Ephemeral keypair the decryption service re-encrypts plaintexts to.
#[derive(Debug)]
pub struct EphemeralKeypair {
    /// Public half, embedded in the disclosure statement.
    pub public_key: Bytes,
    /// Private half, used only to open the service's response.
    pub private_key: SecretString,
}

/// One batch of plaintext values bound to a `(contract, owner)` scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInputBuilder {
    target_contract: Address,
    owner: Address,
    values: Vec<u32>,
}

impl EncryptedInputBuilder {
    /// Starts an empty batch for `target_contract`, usable only by `owner`.
    #[must_use]
    pub const fn new(target_contract: Address, owner: Address) -> Self {
        Self {
            target_contract,
            owner,
            values: Vec::new(),
        }
    }

    /// Appends a 32-bit unsigned value to the batch.
    pub fn add32(&mut self, value: u32) -> &mut Self {
        self.values.push(value);
        self
    }

    /// Contract the encrypted inputs are scoped to.
    #[must_use]
    pub const fn target_contract(&self) -> Address {
        self.target_contract
    }

    /// Account allowed to submit the inputs.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Plaintext values in insertion order.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        &self.values
    }
}

/// Output of encrypting a batch: one handle per value and a shared proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInputProof {
    /// Handles in the order the values were added.
    pub handles: Vec<Handle>,
    /// Attestation that the handles were built for the batch scope.
    pub input_proof: Bytes,
}

/// A handle to reveal, together with the contract that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleContractPair {
    /// The encrypted value.
    pub handle: Handle,
    /// Contract under whose ACL the handle lives.
    pub contract: Address,
}

/// Homomorphic-encryption client talking to the relay and decryption service.
#[async_trait]
pub trait CryptoGateway: Send + Sync {
    /// Generates a fresh ephemeral keypair for a decryption authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot produce key material.
    fn generate_keypair(&self) -> GatewayResult<EphemeralKeypair>;

    /// Starts an input batch scoped to `(target_contract, owner)`.
    fn create_encrypted_input(
        &self,
        target_contract: Address,
        owner: Address,
    ) -> EncryptedInputBuilder {
        EncryptedInputBuilder::new(target_contract, owner)
    }

    /// Encrypts a batch and obtains its input proof. May fail transiently.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] describing the failure category.
    async fn encrypt(&self, input: &EncryptedInputBuilder) -> GatewayResult<EncryptedInputProof>;

    /// Reveals plaintexts for `requests` to the holder of `authorization`.
    ///
    /// Implementations must fail as a whole if any pair is not covered by the
    /// authorization; partial disclosure is not allowed.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] describing the failure category.
    async fn user_decrypt(
        &self,
        requests: &[HandleContractPair],
        authorization: &DecryptionAuthorization,
    ) -> GatewayResult<HashMap<Handle, U256>>;
}
