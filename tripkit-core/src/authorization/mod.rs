//! Time-boxed, scope-boxed grants letting the decryption service reveal
//! FHE plaintexts to their owner.
//!
//! A grant is an ephemeral keypair plus the owner's signature over a
//! [`DisclosureStatement`]. Grants are cached per `(owner, contracts)` in a
//! caller-provided [`SessionStore`] so the interactive signature is requested
//! at most once per validity window.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, Bytes, U256};
use secrecy::SecretString;

use crate::config::Config;
use crate::error::{TripKitError, TripKitResult};
use crate::gateway::{
    CryptoGateway, GatewayError, GatewayErrorKind, Handle, HandleContractPair,
};
use crate::signer::{Signer, SignerError};

mod session;
mod statement;

pub use session::{MemorySessionStore, SessionStore};
pub use statement::{DisclosureDomain, DisclosureStatement, UserDecryptRequestVerification};

/// Validity window applied to new grants unless configured otherwise.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

const SECONDS_PER_DAY: u64 = 86_400;

/// Cache key of an authorization: the owner and its sorted, de-duplicated
/// contract set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorizationCacheKey {
    owner: Address,
    contracts: Vec<Address>,
}

impl AuthorizationCacheKey {
    /// Builds the key for `owner` requesting `contracts` (in any order).
    #[must_use]
    pub fn new(owner: Address, contracts: &[Address]) -> Self {
        Self {
            owner,
            contracts: normalize_contracts(contracts),
        }
    }

    /// The owner part of the key.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// The normalized contract set.
    #[must_use]
    pub fn contracts(&self) -> &[Address] {
        &self.contracts
    }
}

impl fmt::Display for AuthorizationCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.owner)?;
        for (i, contract) in self.contracts.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{contract}")?;
        }
        Ok(())
    }
}

/// A signed grant for the decryption service.
#[derive(Debug)]
pub struct DecryptionAuthorization {
    /// Ephemeral private key opening the service's re-encrypted response.
    pub private_key: SecretString,
    /// Ephemeral public key named in the signed statement.
    pub public_key: Bytes,
    /// Owner signature over the statement's EIP-712 digest.
    pub signature: Bytes,
    /// Contracts covered, sorted and de-duplicated.
    pub contracts: Vec<Address>,
    /// Account that signed the grant and receives the plaintexts.
    pub owner: Address,
    /// Unix timestamp (seconds) the grant was issued at.
    pub issued_at: u64,
    /// Number of days the grant stays valid.
    pub validity_days: u32,
}

impl DecryptionAuthorization {
    /// Key this authorization is cached under.
    #[must_use]
    pub fn cache_key(&self) -> AuthorizationCacheKey {
        AuthorizationCacheKey::new(self.owner, &self.contracts)
    }

    /// Last unix timestamp at which the grant is still valid.
    #[must_use]
    pub fn expires_at(&self) -> u64 {
        self.issued_at
            .saturating_add(u64::from(self.validity_days).saturating_mul(SECONDS_PER_DAY))
    }

    /// Whether the validity window has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at()
    }

    /// Whether the grant covers exactly `owner` and `contracts` (no subset or
    /// superset matching).
    #[must_use]
    pub fn covers(&self, owner: Address, contracts: &[Address]) -> bool {
        self.owner == owner && normalize_contracts(&self.contracts) == normalize_contracts(contracts)
    }

    /// Whether the grant is usable for `owner` and `contracts` right now.
    #[must_use]
    pub fn validate(&self, owner: Address, contracts: &[Address]) -> bool {
        unix_timestamp().is_ok_and(|now| self.validate_at(owner, contracts, now))
    }

    /// Whether the grant is usable for `owner` and `contracts` at `now`.
    #[must_use]
    pub fn validate_at(&self, owner: Address, contracts: &[Address], now: u64) -> bool {
        !self.is_expired_at(now) && self.covers(owner, contracts)
    }

    /// The statement the owner signed for this grant.
    #[must_use]
    pub fn statement(&self, domain: DisclosureDomain) -> DisclosureStatement {
        DisclosureStatement {
            public_key: self.public_key.clone(),
            contracts: self.contracts.clone(),
            owner: self.owner,
            issued_at: self.issued_at,
            validity_days: self.validity_days,
            domain,
        }
    }
}

/// Issues, caches and checks [`DecryptionAuthorization`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionAuthorizer {
    domain: DisclosureDomain,
    validity_days: u32,
}

impl DecryptionAuthorizer {
    /// Creates an authorizer issuing grants valid for `validity_days`.
    #[must_use]
    pub const fn new(domain: DisclosureDomain, validity_days: u32) -> Self {
        Self {
            domain,
            validity_days,
        }
    }

    /// Creates an authorizer from the gateway and policy settings of `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.disclosure_domain(), config.authorization_validity_days)
    }

    /// The EIP-712 domain statements are signed under.
    #[must_use]
    pub const fn domain(&self) -> DisclosureDomain {
        self.domain
    }

    /// Validity window of newly issued grants.
    #[must_use]
    pub const fn validity_days(&self) -> u32 {
        self.validity_days
    }

    /// Returns the cached grant for `(signer, contracts)` if it is still
    /// valid, otherwise asks `signer` for a new one and caches it.
    ///
    /// # Errors
    ///
    /// - [`TripKitError::InvalidArgument`] if `contracts` is empty.
    /// - [`TripKitError::AuthorizationDeclined`] if the signer refuses.
    /// - [`TripKitError::Signer`] if the signer fails otherwise.
    /// - [`TripKitError::Gateway`] if no keypair can be generated.
    /// - [`TripKitError::Environment`] if the session store or clock fails.
    pub async fn load_or_sign(
        &self,
        gateway: &dyn CryptoGateway,
        contracts: &[Address],
        signer: &dyn Signer,
        store: &dyn SessionStore,
    ) -> TripKitResult<Arc<DecryptionAuthorization>> {
        self.load_or_sign_at(gateway, contracts, signer, store, unix_timestamp()?)
            .await
    }

    /// [`DecryptionAuthorizer::load_or_sign`] with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`DecryptionAuthorizer::load_or_sign`].
    pub async fn load_or_sign_at(
        &self,
        gateway: &dyn CryptoGateway,
        contracts: &[Address],
        signer: &dyn Signer,
        store: &dyn SessionStore,
        now: u64,
    ) -> TripKitResult<Arc<DecryptionAuthorization>> {
        if contracts.is_empty() {
            return Err(TripKitError::invalid_argument(
                "contracts",
                "at least one contract must be covered",
            ));
        }
        let owner = signer.address();
        let key = AuthorizationCacheKey::new(owner, contracts);

        if let Some(cached) = store.get(&key)? {
            if cached.validate_at(owner, key.contracts(), now) {
                log::debug!("reusing decryption authorization for {key}");
                return Ok(cached);
            }
            log::debug!("decryption authorization for {key} expired, signing a new one");
        }

        let keypair = gateway.generate_keypair()?;
        let statement = DisclosureStatement {
            public_key: keypair.public_key,
            contracts: key.contracts().to_vec(),
            owner,
            issued_at: now,
            validity_days: self.validity_days,
            domain: self.domain,
        };

        let signature = signer
            .sign_disclosure(&statement)
            .await
            .map_err(|err| match err {
                SignerError::Declined => TripKitError::AuthorizationDeclined,
                SignerError::Failed(reason) => TripKitError::Signer(reason),
            })?;

        let authorization = Arc::new(DecryptionAuthorization {
            private_key: keypair.private_key,
            public_key: statement.public_key,
            signature,
            contracts: statement.contracts,
            owner,
            issued_at: now,
            validity_days: self.validity_days,
        });
        store.set(key.clone(), Arc::clone(&authorization))?;
        log::info!(
            "issued decryption authorization for {key}, valid for {} days",
            self.validity_days
        );
        Ok(authorization)
    }

    /// Reveals `handles` stored under `contract` to the signer.
    ///
    /// An empty handle list returns immediately without signing. Otherwise the
    /// grant is loaded (or signed) before the decryption service is contacted,
    /// and the answer must contain every requested handle.
    ///
    /// # Errors
    ///
    /// Errors of [`DecryptionAuthorizer::load_or_sign`], plus
    /// [`TripKitError::Gateway`] if the service fails or omits a handle.
    pub async fn decrypt_handles(
        &self,
        gateway: &dyn CryptoGateway,
        contract: Address,
        signer: &dyn Signer,
        store: &dyn SessionStore,
        handles: &[Handle],
    ) -> TripKitResult<HashMap<Handle, U256>> {
        if handles.is_empty() {
            return Ok(HashMap::new());
        }
        let now = unix_timestamp()?;
        let authorization = self
            .load_or_sign_at(gateway, &[contract], signer, store, now)
            .await?;
        if !authorization.validate_at(signer.address(), &[contract], now) {
            return Err(GatewayError::new(
                GatewayErrorKind::Unauthorized,
                format!("authorization does not cover contract {contract}"),
            )
            .into());
        }

        let mut unique = handles.to_vec();
        unique.sort_unstable();
        unique.dedup();
        let requests: Vec<HandleContractPair> = unique
            .iter()
            .map(|handle| HandleContractPair {
                handle: *handle,
                contract,
            })
            .collect();
        let revealed = gateway.user_decrypt(&requests, &authorization).await?;

        let mut plaintexts = HashMap::with_capacity(unique.len());
        for handle in &unique {
            let value = revealed.get(handle).copied().ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorKind::MalformedResponse,
                    format!("decryption response is missing handle {handle}"),
                )
            })?;
            plaintexts.insert(*handle, value);
        }
        Ok(plaintexts)
    }
}

fn normalize_contracts(contracts: &[Address]) -> Vec<Address> {
    let mut normalized = contracts.to_vec();
    normalized.sort_unstable();
    normalized.dedup();
    normalized
}

/// Current unix time in seconds.
pub(crate) fn unix_timestamp() -> TripKitResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|err| TripKitError::Environment(format!("system time before unix epoch: {err}")))
}
