//! Local symmetric encryption for bulk trip payloads.
//!
//! Payloads are serialized to JSON and sealed with AES-256-GCM under a key
//! that lives in a single slot of an injected [`KeyValueStore`]. The key is
//! created lazily on first use and then reused for the lifetime of the slot.

use std::sync::{Arc, Mutex};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use zeroize::Zeroizing;

use crate::error::{TripKitError, TripKitResult};
use crate::storage::{KeyValueStore, UnavailableKeyValueStore};

mod envelope;
mod key;

pub use envelope::{EncryptedEnvelope, ENVELOPE_VERSION, NONCE_SIZE, TAG_SIZE};
pub use key::{SymmetricKey, KEY_SIZE};

/// Storage slot holding the vault key unless configured otherwise.
pub const DEFAULT_KEY_SLOT: &str = "encrypted-trip-planner-key";

/// Seals and opens structured payloads with a device-local symmetric key.
pub struct SymmetricVault {
    storage: Arc<dyn KeyValueStore>,
    slot: String,
    key: Mutex<Option<SymmetricKey>>,
}

impl std::fmt::Debug for SymmetricVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricVault")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl SymmetricVault {
    /// Creates a vault over `storage` using [`DEFAULT_KEY_SLOT`].
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_slot(storage, DEFAULT_KEY_SLOT)
    }

    /// Creates a vault over `storage` using a custom slot name.
    #[must_use]
    pub fn with_slot(storage: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
            key: Mutex::new(None),
        }
    }

    /// Creates a vault over an explicit key. No storage is consulted.
    #[must_use]
    pub fn with_key(key: SymmetricKey) -> Self {
        Self {
            storage: Arc::new(UnavailableKeyValueStore::new("vault built from an explicit key")),
            slot: String::new(),
            key: Mutex::new(Some(key)),
        }
    }

    /// Returns the storage slot name backing this vault.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Serializes `payload` and seals it under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// - [`TripKitError::Environment`] if the key slot cannot be read or written.
    /// - [`TripKitError::Format`] if the stored key is corrupted.
    /// - [`TripKitError::Serialization`] if `payload` cannot be serialized or
    ///   is too large to seal.
    pub fn encrypt<T: Serialize + ?Sized>(&self, payload: &T) -> TripKitResult<EncryptedEnvelope> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(payload)
                .map_err(|err| TripKitError::Serialization(err.to_string()))?,
        );
        let cipher = self.cipher()?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(seal_error)?;

        Ok(EncryptedEnvelope::new(nonce, ciphertext))
    }

    /// Seals `payload` and returns the envelope bytes ready for the ledger.
    ///
    /// # Errors
    ///
    /// See [`SymmetricVault::encrypt`].
    pub fn encrypt_to_bytes<T: Serialize + ?Sized>(&self, payload: &T) -> TripKitResult<Vec<u8>> {
        self.encrypt(payload)?.to_bytes()
    }

    /// Parses envelope bytes and opens them back into a value.
    ///
    /// # Errors
    ///
    /// - [`TripKitError::Format`] if the envelope is malformed or of an unknown version.
    /// - [`TripKitError::Authentication`] if the integrity check fails.
    /// - [`TripKitError::Serialization`] if the plaintext does not parse as `T`.
    /// - [`TripKitError::Environment`] if the key slot cannot be accessed.
    pub fn decrypt<T: DeserializeOwned>(&self, bytes: &[u8]) -> TripKitResult<T> {
        let envelope = EncryptedEnvelope::from_bytes(bytes)?;
        self.decrypt_envelope(&envelope)
    }

    /// Opens an already parsed envelope.
    ///
    /// # Errors
    ///
    /// See [`SymmetricVault::decrypt`].
    pub fn decrypt_envelope<T: DeserializeOwned>(
        &self,
        envelope: &EncryptedEnvelope,
    ) -> TripKitResult<T> {
        if envelope.version != ENVELOPE_VERSION {
            return Err(TripKitError::Format(format!(
                "unsupported envelope version: {}",
                envelope.version
            )));
        }
        let cipher = self.cipher()?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_slice())
                .map_err(|_| TripKitError::Authentication)?,
        );
        serde_json::from_slice(&plaintext)
            .map_err(|err| TripKitError::Serialization(err.to_string()))
    }

    fn cipher(&self) -> TripKitResult<Aes256Gcm> {
        let mut guard = self
            .key
            .lock()
            .map_err(|_| TripKitError::Environment("vault key lock poisoned".to_string()))?;
        if guard.is_none() {
            *guard = Some(self.load_or_create_key()?);
        }
        let key = guard
            .as_ref()
            .ok_or_else(|| TripKitError::Environment("vault key unavailable".to_string()))?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes())))
    }

    fn load_or_create_key(&self) -> TripKitResult<SymmetricKey> {
        if let Some(encoded) = self.storage.get(&self.slot)? {
            return SymmetricKey::from_base64(&encoded);
        }

        let candidate = SymmetricKey::generate();
        let stored = Zeroizing::new(
            self.storage
                .insert_if_absent(&self.slot, &candidate.to_base64())?,
        );
        if stored.as_str() == candidate.to_base64().as_str() {
            log::info!("generated vault key in slot {}", self.slot);
        } else {
            log::debug!("slot {} was initialized concurrently, adopting stored key", self.slot);
        }
        SymmetricKey::from_base64(&stored)
    }
}

fn seal_error(_: aes_gcm::Error) -> TripKitError {
    TripKitError::Serialization("payload too large to seal".to_string())
}
