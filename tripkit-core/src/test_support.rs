//! In-process collaborators for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use secrecy::SecretString;

use crate::authorization::{DecryptionAuthorization, DisclosureStatement};
use crate::gateway::{
    CryptoGateway, EncryptedInputBuilder, EncryptedInputProof, EphemeralKeypair, GatewayError,
    GatewayErrorKind, GatewayResult, Handle, HandleContractPair,
};
use crate::signer::{Signer, SignerError};

pub const NOW: u64 = 1_760_000_000;
pub const OWNER: Address = Address::repeat_byte(0x0A);

pub fn contract(n: u8) -> Address {
    Address::repeat_byte(0xC0 | n)
}

#[derive(Debug)]
struct Sealed {
    contract: Address,
    owner: Address,
    value: u32,
}

/// Gateway keeping plaintexts in memory, with scriptable encrypt failures.
#[derive(Debug, Default)]
pub struct FakeGateway {
    pub keypairs: AtomicUsize,
    pub encrypt_calls: AtomicUsize,
    pub decrypt_calls: AtomicUsize,
    next_handle: AtomicU64,
    sealed: Mutex<HashMap<Handle, Sealed>>,
    omitted: Mutex<HashSet<Handle>>,
    encrypt_failures: Mutex<VecDeque<GatewayErrorKind>>,
    empty_responses: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&self, contract: Address, owner: Address, value: u32) -> Handle {
        let n = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = B256::left_padding_from(&n.to_be_bytes());
        self.sealed.lock().expect("sealed").insert(
            handle,
            Sealed {
                contract,
                owner,
                value,
            },
        );
        handle
    }

    /// Seals `value` directly, as if a previous session had encrypted it.
    pub fn register(&self, contract: Address, owner: Address, value: u32) -> Handle {
        self.mint(contract, owner, value)
    }

    pub fn omit_from_answers(&self, handle: Handle) {
        self.omitted.lock().expect("omitted").insert(handle);
    }

    /// The next encrypt calls fail with `kinds`, in order.
    pub fn fail_encrypts(&self, kinds: &[GatewayErrorKind]) {
        self.encrypt_failures
            .lock()
            .expect("failures")
            .extend(kinds.iter().copied());
    }

    /// The next `count` encrypt calls answer with no handles.
    pub fn answer_empty(&self, count: usize) {
        self.empty_responses.store(count, Ordering::SeqCst);
    }

    pub fn plaintext(&self, handle: &Handle) -> Option<u32> {
        self.sealed
            .lock()
            .expect("sealed")
            .get(handle)
            .map(|sealed| sealed.value)
    }
}

#[async_trait]
impl CryptoGateway for FakeGateway {
    fn generate_keypair(&self) -> GatewayResult<EphemeralKeypair> {
        let n = u8::try_from(self.keypairs.fetch_add(1, Ordering::SeqCst)).unwrap_or(u8::MAX);
        Ok(EphemeralKeypair {
            public_key: Bytes::from(vec![0x50, n]),
            private_key: SecretString::from(format!("private-{n}")),
        })
    }

    async fn encrypt(&self, input: &EncryptedInputBuilder) -> GatewayResult<EncryptedInputProof> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.encrypt_failures.lock().expect("failures").pop_front() {
            return Err(GatewayError::new(kind, "scripted failure"));
        }
        if self
            .empty_responses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
        {
            return Ok(EncryptedInputProof {
                handles: Vec::new(),
                input_proof: Bytes::new(),
            });
        }
        let handles = input
            .values()
            .iter()
            .map(|value| self.mint(input.target_contract(), input.owner(), *value))
            .collect();
        Ok(EncryptedInputProof {
            handles,
            input_proof: Bytes::from_static(b"proof"),
        })
    }

    async fn user_decrypt(
        &self,
        requests: &[HandleContractPair],
        authorization: &DecryptionAuthorization,
    ) -> GatewayResult<HashMap<Handle, U256>> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        let sealed = self.sealed.lock().expect("sealed");
        let omitted = self.omitted.lock().expect("omitted");
        let mut revealed = HashMap::new();
        for request in requests {
            if !authorization.contracts.contains(&request.contract) {
                return Err(GatewayError::new(
                    GatewayErrorKind::Unauthorized,
                    "contract not covered",
                ));
            }
            let entry = sealed.get(&request.handle).ok_or_else(|| {
                GatewayError::new(GatewayErrorKind::InvalidRequest, "unknown handle")
            })?;
            if entry.contract != request.contract || entry.owner != authorization.owner {
                return Err(GatewayError::new(
                    GatewayErrorKind::Unauthorized,
                    "handle not accessible",
                ));
            }
            if !omitted.contains(&request.handle) {
                revealed.insert(request.handle, U256::from(entry.value));
            }
        }
        Ok(revealed)
    }
}

#[derive(Debug)]
enum Behavior {
    Sign,
    Decline,
    Fail(String),
}

/// Signer returning the statement digest as its "signature".
#[derive(Debug)]
pub struct FakeSigner {
    address: Address,
    behavior: Behavior,
    pub signatures: AtomicUsize,
}

impl FakeSigner {
    pub const fn new(address: Address) -> Self {
        Self {
            address,
            behavior: Behavior::Sign,
            signatures: AtomicUsize::new(0),
        }
    }

    pub const fn declining(address: Address) -> Self {
        Self {
            address,
            behavior: Behavior::Decline,
            signatures: AtomicUsize::new(0),
        }
    }

    pub fn failing(address: Address, reason: &str) -> Self {
        Self {
            address,
            behavior: Behavior::Fail(reason.to_string()),
            signatures: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Signer for FakeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_disclosure(&self, statement: &DisclosureStatement) -> Result<Bytes, SignerError> {
        self.signatures.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Sign => Ok(Bytes::copy_from_slice(statement.signing_hash().as_slice())),
            Behavior::Decline => Err(SignerError::Declined),
            Behavior::Fail(reason) => Err(SignerError::Failed(reason.clone())),
        }
    }
}
