#![allow(dead_code, missing_docs, reason = "shared across integration test binaries")]

//! Common test utilities shared across integration tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Signature};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use secrecy::SecretString;
use tripkit_core::authorization::{DisclosureDomain, DisclosureStatement};
use tripkit_core::gateway::{
    EncryptedInputBuilder, EncryptedInputProof, EphemeralKeypair, GatewayResult,
    HandleContractPair,
};
use tripkit_core::ledger::{
    LedgerError, RecordId, StoredTrip, StyleStatsHandles, TripSubmission, TripSummary,
};
use tripkit_core::trip::TravelStyle;
use tripkit_core::{
    Config, CryptoGateway, DecryptionAuthorization, Environment, GatewayError, GatewayErrorKind,
    Handle, PlannerLedger, Signer, SignerError,
};

pub const PLANNER: Address = Address::repeat_byte(0x7A);

pub fn test_config() -> Config {
    let mut config = Config::from_environment(Environment::Localhost).with_planner_address(PLANNER);
    config.retry.base_delay_ms = 1;
    config
}

#[derive(Debug)]
struct Ciphertext {
    value: u32,
    readers: HashSet<Address>,
}

/// Coprocessor stand-in: keeps plaintexts behind handles and checks real
/// EIP-712 signatures before revealing them.
#[derive(Debug)]
pub struct LocalRelay {
    domain: DisclosureDomain,
    counter: AtomicUsize,
    ciphertexts: Mutex<HashMap<Handle, Ciphertext>>,
    encrypt_failures: Mutex<VecDeque<GatewayErrorKind>>,
    pub encrypt_calls: AtomicUsize,
    pub decrypt_calls: AtomicUsize,
}

impl LocalRelay {
    pub fn new(domain: DisclosureDomain) -> Self {
        Self {
            domain,
            counter: AtomicUsize::new(0),
            ciphertexts: Mutex::new(HashMap::new()),
            encrypt_failures: Mutex::new(VecDeque::new()),
            encrypt_calls: AtomicUsize::new(0),
            decrypt_calls: AtomicUsize::new(0),
        }
    }

    fn mint(&self, value: u32, readers: impl IntoIterator<Item = Address>) -> Handle {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let handle = keccak256(n.to_be_bytes());
        self.ciphertexts.lock().expect("ciphertexts").insert(
            handle,
            Ciphertext {
                value,
                readers: readers.into_iter().collect(),
            },
        );
        handle
    }

    fn value(&self, handle: &Handle) -> u32 {
        if handle.is_zero() {
            return 0;
        }
        self.ciphertexts
            .lock()
            .expect("ciphertexts")
            .get(handle)
            .map_or(0, |ciphertext| ciphertext.value)
    }

    /// Homomorphic addition performed by the contract.
    pub fn add(&self, lhs: &Handle, rhs: &Handle, readers: &[Address]) -> Handle {
        let sum = self.value(lhs).wrapping_add(self.value(rhs));
        self.mint(sum, readers.iter().copied())
    }

    /// The next encrypt calls fail with `kinds`, in order.
    pub fn fail_encrypts(&self, kinds: &[GatewayErrorKind]) {
        self.encrypt_failures
            .lock()
            .expect("failures")
            .extend(kinds.iter().copied());
    }

    /// Grants `reader` access to `handle`, as the contract ACL does.
    pub fn allow(&self, handle: &Handle, reader: Address) {
        if let Some(ciphertext) = self.ciphertexts.lock().expect("ciphertexts").get_mut(handle) {
            ciphertext.readers.insert(reader);
        }
    }

    fn verify(&self, authorization: &DecryptionAuthorization) -> GatewayResult<()> {
        let digest = authorization.statement(self.domain).signing_hash();
        let signer = Signature::from_raw(&authorization.signature)
            .ok()
            .and_then(|signature| signature.recover_address_from_prehash(&digest).ok());
        if signer == Some(authorization.owner) {
            Ok(())
        } else {
            Err(GatewayError::new(
                GatewayErrorKind::Unauthorized,
                "signature does not match owner",
            ))
        }
    }
}

#[async_trait]
impl CryptoGateway for LocalRelay {
    fn generate_keypair(&self) -> GatewayResult<EphemeralKeypair> {
        let seed = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(EphemeralKeypair {
            public_key: Bytes::copy_from_slice(keccak256(seed.to_le_bytes()).as_slice()),
            private_key: SecretString::from(format!("ephemeral-{seed}")),
        })
    }

    async fn encrypt(&self, input: &EncryptedInputBuilder) -> GatewayResult<EncryptedInputProof> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.encrypt_failures.lock().expect("failures").pop_front() {
            return Err(GatewayError::new(kind, "relay overloaded"));
        }
        let handles = input
            .values()
            .iter()
            .map(|value| self.mint(*value, [input.target_contract()]))
            .collect();
        Ok(EncryptedInputProof {
            handles,
            input_proof: Bytes::copy_from_slice(input.owner().as_slice()),
        })
    }

    async fn user_decrypt(
        &self,
        requests: &[HandleContractPair],
        authorization: &DecryptionAuthorization,
    ) -> GatewayResult<HashMap<Handle, U256>> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.verify(authorization)?;
        let ciphertexts = self.ciphertexts.lock().expect("ciphertexts");
        let mut revealed = HashMap::new();
        for request in requests {
            let ciphertext = ciphertexts
                .get(&request.handle)
                .filter(|ciphertext| {
                    authorization.contracts.contains(&request.contract)
                        && ciphertext.readers.contains(&authorization.owner)
                })
                .ok_or_else(|| {
                    GatewayError::new(
                        GatewayErrorKind::Unauthorized,
                        format!("{} may not read {}", authorization.owner, request.handle),
                    )
                })?;
            revealed.insert(request.handle, U256::from(ciphertext.value));
        }
        Ok(revealed)
    }
}

/// Wallet backed by a local secp256k1 key.
pub struct Wallet {
    key: PrivateKeySigner,
    decline: bool,
    pub prompts: AtomicUsize,
}

impl Wallet {
    pub fn random() -> Self {
        Self {
            key: PrivateKeySigner::random(),
            decline: false,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn declining() -> Self {
        Self {
            decline: true,
            ..Self::random()
        }
    }
}

#[async_trait]
impl Signer for Wallet {
    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign_disclosure(&self, statement: &DisclosureStatement) -> Result<Bytes, SignerError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if self.decline {
            return Err(SignerError::Declined);
        }
        let signature = self
            .key
            .sign_hash_sync(&statement.signing_hash())
            .map_err(|err| SignerError::Failed(err.to_string()))?;
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    trips: Vec<(Address, StoredTrip)>,
    stats: HashMap<TravelStyle, StyleStatsHandles>,
    clock: u64,
}

/// Planner contract stand-in for a single connected account.
pub struct InMemoryLedger {
    relay: Arc<LocalRelay>,
    caller: Address,
    state: Arc<Mutex<LedgerState>>,
    pub reads: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new(relay: Arc<LocalRelay>, caller: Address) -> Self {
        Self {
            relay,
            caller,
            state: Arc::new(Mutex::new(LedgerState {
                clock: 1_760_000_000,
                ..LedgerState::default()
            })),
            reads: AtomicUsize::new(0),
        }
    }

    /// Connection for another account over the same contract state.
    pub fn connect(&self, caller: Address) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            caller,
            state: Arc::clone(&self.state),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn raw_trip(&self, id: RecordId) -> StoredTrip {
        let state = self.state.lock().expect("state");
        state.trips[usize::try_from(id).expect("id")].1.clone()
    }

    pub fn trip_count(&self) -> usize {
        self.state.lock().expect("state").trips.len()
    }
}

#[async_trait]
impl PlannerLedger for InMemoryLedger {
    async fn store_trip(&self, submission: TripSubmission) -> Result<RecordId, LedgerError> {
        if submission.title.is_empty() {
            return Err(LedgerError::Rejected("empty title".to_string()));
        }
        let mut state = self.state.lock().expect("state");
        state.clock += 60;
        let created_at = state.clock;

        let current = state.stats.get(&submission.style).copied().unwrap_or(StyleStatsHandles {
            trip_count: B256::ZERO,
            total_nights: B256::ZERO,
        });
        let updated = StyleStatsHandles {
            trip_count: self
                .relay
                .add(&current.trip_count, &submission.unit.handle, &[PLANNER]),
            total_nights: self
                .relay
                .add(&current.total_nights, &submission.nights.handle, &[PLANNER]),
        };
        state.stats.insert(submission.style, updated);

        state.trips.push((
            self.caller,
            StoredTrip {
                route_ciphertext: submission.route_ciphertext,
                schedule_ciphertext: submission.schedule_ciphertext,
                created_at,
                style: submission.style,
                title: submission.title,
            },
        ));
        Ok((state.trips.len() - 1) as RecordId)
    }

    async fn get_my_trip(&self, id: RecordId) -> Result<StoredTrip, LedgerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().expect("state");
        usize::try_from(id)
            .ok()
            .and_then(|index| state.trips.get(index))
            .filter(|(owner, _)| *owner == self.caller)
            .map(|(_, trip)| trip.clone())
            .ok_or(LedgerError::NotFound(id))
    }

    async fn list_my_trips(&self) -> Result<Vec<TripSummary>, LedgerError> {
        let state = self.state.lock().expect("state");
        Ok(state
            .trips
            .iter()
            .enumerate()
            .filter(|(_, (owner, _))| *owner == self.caller)
            .map(|(index, (_, trip))| TripSummary {
                id: index as RecordId,
                title: trip.title.clone(),
                created_at: trip.created_at,
                style: trip.style,
            })
            .collect())
    }

    async fn subscribe_to_style_stats(&self, style: TravelStyle) -> Result<(), LedgerError> {
        let state = self.state.lock().expect("state");
        if let Some(stats) = state.stats.get(&style) {
            self.relay.allow(&stats.trip_count, self.caller);
            self.relay.allow(&stats.total_nights, self.caller);
        }
        Ok(())
    }

    async fn style_stats(&self, style: TravelStyle) -> Result<StyleStatsHandles, LedgerError> {
        let state = self.state.lock().expect("state");
        Ok(state.stats.get(&style).copied().unwrap_or(StyleStatsHandles {
            trip_count: B256::ZERO,
            total_nights: B256::ZERO,
        }))
    }
}
