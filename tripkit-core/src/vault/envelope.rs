//! Versioned wire format for sealed payloads.
//!
//! An envelope is stored on the ledger as the UTF-8 bytes of a JSON object:
//!
//! ```text
//! {"v":1,"iv":"<base64 12-byte nonce>","data":"<base64 ciphertext || tag>"}
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{TripKitError, TripKitResult};

/// Current envelope version.
pub const ENVELOPE_VERSION: u32 = 1;

/// AES-GCM nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// A sealed payload: version, per-encryption nonce and AEAD ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Scheme version, see [`ENVELOPE_VERSION`].
    pub version: u32,
    /// Random nonce drawn for this encryption only.
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct EnvelopeWire {
    v: u32,
    iv: String,
    data: String,
}

impl EncryptedEnvelope {
    pub(crate) const fn new(nonce: [u8; NONCE_SIZE], ciphertext: Vec<u8>) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            nonce,
            ciphertext,
        }
    }

    /// Serializes the envelope into its on-ledger byte form.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::Serialization`] if JSON encoding fails.
    pub fn to_bytes(&self) -> TripKitResult<Vec<u8>> {
        let wire = EnvelopeWire {
            v: self.version,
            iv: STANDARD.encode(self.nonce),
            data: STANDARD.encode(&self.ciphertext),
        };
        serde_json::to_vec(&wire).map_err(|err| TripKitError::Serialization(err.to_string()))
    }

    /// Parses the on-ledger byte form.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::Format`] if the bytes are not an envelope, the
    /// version is unknown, or the nonce/ciphertext have impossible lengths.
    pub fn from_bytes(bytes: &[u8]) -> TripKitResult<Self> {
        let wire: EnvelopeWire = serde_json::from_slice(bytes)
            .map_err(|err| TripKitError::Format(format!("malformed envelope: {err}")))?;
        if wire.v != ENVELOPE_VERSION {
            return Err(TripKitError::Format(format!(
                "unsupported envelope version: {}",
                wire.v
            )));
        }

        let nonce_bytes = STANDARD
            .decode(&wire.iv)
            .map_err(|err| TripKitError::Format(format!("envelope nonce: {err}")))?;
        let nonce: [u8; NONCE_SIZE] = nonce_bytes.as_slice().try_into().map_err(|_| {
            TripKitError::Format(format!(
                "envelope nonce length mismatch: expected {NONCE_SIZE}, got {}",
                nonce_bytes.len()
            ))
        })?;

        let ciphertext = STANDARD
            .decode(&wire.data)
            .map_err(|err| TripKitError::Format(format!("envelope ciphertext: {err}")))?;
        if ciphertext.len() < TAG_SIZE {
            return Err(TripKitError::Format(
                "envelope ciphertext shorter than authentication tag".to_string(),
            ));
        }

        Ok(Self {
            version: wire.v,
            nonce,
            ciphertext,
        })
    }

    /// Encodes the envelope bytes as `0x`-prefixed hex, the form the ledger accepts.
    ///
    /// # Errors
    ///
    /// See [`EncryptedEnvelope::to_bytes`].
    pub fn to_hex(&self) -> TripKitResult<String> {
        Ok(format!("0x{}", hex::encode(self.to_bytes()?)))
    }

    /// Parses hex produced by [`EncryptedEnvelope::to_hex`]; the `0x` prefix is optional.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::Format`] for invalid hex or envelope content.
    pub fn from_hex(encoded: &str) -> TripKitResult<Self> {
        let trimmed = encoded.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|err| TripKitError::Format(format!("envelope hex: {err}")))?;
        Self::from_bytes(&bytes)
    }
}
