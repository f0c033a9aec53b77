//! Homomorphic encryption of small counters through the gateway.

use alloy_primitives::{Address, Bytes};

use crate::error::{TripKitError, TripKitResult};
use crate::gateway::{CryptoGateway, GatewayError, GatewayErrorKind, Handle};
use crate::retry::RetryPolicy;

/// A 32-bit value encrypted for one `(contract, owner)` scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericCiphertext {
    /// Reference the contract stores.
    pub handle: Handle,
    /// Proof the contract checks when the handle is submitted.
    pub input_proof: Bytes,
}

/// Encrypts `euint32` inputs, retrying transient relay failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumericEncryptor {
    retry: RetryPolicy,
}

impl NumericEncryptor {
    /// Creates an encryptor using `retry` for every relay call.
    #[must_use]
    pub const fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// The retry policy in use.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Encrypts `value` so only `owner` can submit it to `target_contract`.
    ///
    /// Every call yields a fresh ciphertext; nothing is cached.
    ///
    /// # Errors
    ///
    /// - [`TripKitError::InvalidArgument`] if `owner` is missing or the zero
    ///   address, or `value` does not fit in 32 bits. The gateway is not called.
    /// - [`TripKitError::RelayUnavailable`] once the retry budget is spent on
    ///   transient failures.
    /// - [`TripKitError::Gateway`] for any non-retryable failure, unchanged.
    pub async fn encrypt_uint32(
        &self,
        gateway: &dyn CryptoGateway,
        target_contract: Address,
        owner: Option<Address>,
        value: u64,
    ) -> TripKitResult<NumericCiphertext> {
        let owner = owner.filter(|owner| !owner.is_zero()).ok_or_else(|| {
            TripKitError::invalid_argument("owner", "an owner address is required")
        })?;
        let value = u32::try_from(value).map_err(|_| {
            TripKitError::invalid_argument("value", format!("{value} does not fit in 32 bits"))
        })?;

        let mut input = gateway.create_encrypted_input(target_contract, owner);
        input.add32(value);
        let input = &input;

        let result = self
            .retry
            .run(
                || async move {
                    let proof = gateway.encrypt(input).await?;
                    let handle = proof.handles.first().copied().ok_or_else(|| {
                        GatewayError::new(
                            GatewayErrorKind::MalformedResponse,
                            "relayer returned no handles",
                        )
                    })?;
                    Ok::<_, GatewayError>(NumericCiphertext {
                        handle,
                        input_proof: proof.input_proof,
                    })
                },
                GatewayError::is_retryable,
            )
            .await;

        match result {
            Ok(ciphertext) => Ok(ciphertext),
            Err(err) if err.is_retryable() => {
                log::error!(
                    "encryption for {target_contract} gave up after {} attempts: {err}",
                    self.retry.max_attempts()
                );
                Err(TripKitError::RelayUnavailable)
            }
            Err(err) => Err(err.into()),
        }
    }
}
