//! EIP-712 disclosure statement signed by the owner.

use std::borrow::Cow;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};

mod typed {
    #![allow(missing_docs)]

    alloy_sol_types::sol! {
        /// Typed payload the decryption service verifies before re-encrypting
        /// plaintexts to `publicKey`.
        struct UserDecryptRequestVerification {
            bytes publicKey;
            address[] contractAddresses;
            uint256 startTimestamp;
            uint256 durationDays;
            bytes extraData;
        }
    }
}

pub use typed::UserDecryptRequestVerification;

const DOMAIN_NAME: &str = "Decryption";
const DOMAIN_VERSION: &str = "1";

/// Chain and verifying contract the decryption service checks signatures against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisclosureDomain {
    /// Chain id of the gateway chain.
    pub chain_id: u64,
    /// Decryption contract acting as the EIP-712 verifying contract.
    pub verifying_contract: Address,
}

impl DisclosureDomain {
    /// The EIP-712 domain separator inputs.
    #[must_use]
    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Borrowed(DOMAIN_NAME)),
            Some(Cow::Borrowed(DOMAIN_VERSION)),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}

/// A request, presented to the owner, to let the decryption service reveal
/// plaintexts under `contracts` to the holder of `public_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureStatement {
    /// Ephemeral public key plaintexts get re-encrypted to.
    pub public_key: Bytes,
    /// Contracts covered, sorted and de-duplicated.
    pub contracts: Vec<Address>,
    /// Account expected to sign.
    pub owner: Address,
    /// Unix timestamp (seconds) the grant starts at.
    pub issued_at: u64,
    /// Number of days the grant stays valid.
    pub validity_days: u32,
    /// Domain the signature is bound to.
    pub domain: DisclosureDomain,
}

impl DisclosureStatement {
    /// The typed struct as it is hashed and shown to the signer.
    #[must_use]
    pub fn typed_data(&self) -> UserDecryptRequestVerification {
        UserDecryptRequestVerification {
            publicKey: self.public_key.clone(),
            contractAddresses: self.contracts.clone(),
            startTimestamp: U256::from(self.issued_at),
            durationDays: U256::from(self.validity_days),
            extraData: Bytes::new(),
        }
    }

    /// EIP-712 digest the owner signs.
    #[must_use]
    pub fn signing_hash(&self) -> B256 {
        self.typed_data().eip712_signing_hash(&self.domain.eip712())
    }
}
