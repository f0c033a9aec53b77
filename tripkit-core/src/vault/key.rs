//! The persisted 256-bit vault key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{TripKitError, TripKitResult};

/// Length of the symmetric key in bytes.
pub const KEY_SIZE: usize = 32;

/// Symmetric key (256-bit) sealing bulk payloads.
///
/// The key never leaves the device. It is zeroized on drop and redacted from
/// `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generates a new random key from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns a reference to the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Encodes the key for the storage slot (standard base64).
    #[must_use]
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.0))
    }

    /// Decodes a key previously written by [`SymmetricKey::to_base64`].
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::Format`] if the slot does not hold exactly 32
    /// base64-encoded bytes.
    pub fn from_base64(encoded: &str) -> TripKitResult<Self> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|err| TripKitError::Format(format!("stored key is not base64: {err}")))?,
        );
        if bytes.len() != KEY_SIZE {
            return Err(TripKitError::Format(format!(
                "stored key length mismatch: expected {KEY_SIZE}, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; KEY_SIZE];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
