use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::authorization::{DisclosureDomain, DEFAULT_VALIDITY_DAYS};
use crate::error::{TripKitError, TripKitResult};
use crate::retry::RetryPolicy;
use crate::vault::DEFAULT_KEY_SLOT;

/// Chain id of the local development node.
pub const LOCALHOST_CHAIN_ID: u64 = 31_337;

/// Chain id of the Sepolia test network.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Chain id the decryption service verifies EIP-712 statements under.
pub const GATEWAY_CHAIN_ID: u64 = 55_815;

/// Verifying contract of the decryption service.
pub static DECRYPTION_CONTRACT: Address = address!("0xb6E160B1ff80D67Bfe90A85eE06Ce0A2613607D1");

/// Public relayer serving the Sepolia deployment.
pub const SEPOLIA_RELAYER_URL: &str = "https://relayer.testnet.zama.cloud";

/// Deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Local development node with a mock coprocessor.
    Localhost,
    /// Sepolia test network with the public relayer.
    Sepolia,
}

/// Where the relay and decryption service live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Relayer endpoint. `None` when the local node serves FHE itself.
    #[serde(default)]
    pub relayer_url: Option<String>,
    /// EIP-712 verifying contract of disclosure statements.
    pub decryption_contract: Address,
    /// EIP-712 chain id of disclosure statements.
    pub gateway_chain_id: u64,
}

/// Retry budget for relay calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of calls, including the first one.
    pub max_attempts: u32,
    /// Delay unit of the linear backoff, in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

const fn default_validity_days() -> u32 {
    DEFAULT_VALIDITY_DAYS
}

fn default_key_slot() -> String {
    DEFAULT_KEY_SLOT.to_string()
}

/// Client configuration for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Chain the planner contract is deployed on.
    pub chain_id: u64,
    /// Planner contract. The zero address means "not deployed".
    #[serde(default)]
    pub planner_address: Option<Address>,
    /// Relay and decryption service.
    pub gateway: GatewayConfig,
    /// Retry budget for relay calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Lifetime of newly issued decryption authorizations.
    #[serde(default = "default_validity_days")]
    pub authorization_validity_days: u32,
    /// Storage slot of the symmetric vault key.
    #[serde(default = "default_key_slot")]
    pub key_storage_slot: String,
}

impl Config {
    /// Defaults for `environment`, without a planner address.
    #[must_use]
    pub fn from_environment(environment: Environment) -> Self {
        let (chain_id, relayer_url) = match environment {
            Environment::Localhost => (LOCALHOST_CHAIN_ID, None),
            Environment::Sepolia => (SEPOLIA_CHAIN_ID, Some(SEPOLIA_RELAYER_URL.to_string())),
        };
        Self {
            chain_id,
            planner_address: None,
            gateway: GatewayConfig {
                relayer_url,
                decryption_contract: DECRYPTION_CONTRACT,
                gateway_chain_id: GATEWAY_CHAIN_ID,
            },
            retry: RetryConfig::default(),
            authorization_validity_days: DEFAULT_VALIDITY_DAYS,
            key_storage_slot: default_key_slot(),
        }
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::InvalidArgument`] if `json` is not a valid
    /// configuration.
    pub fn from_json(json: &str) -> TripKitResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| TripKitError::invalid_argument("config", err.to_string()))
    }

    /// Sets the planner contract address.
    #[must_use]
    pub fn with_planner_address(mut self, planner_address: Address) -> Self {
        self.planner_address = Some(planner_address);
        self
    }

    /// The deployed planner contract, if any.
    #[must_use]
    pub fn planner_address(&self) -> Option<Address> {
        self.planner_address.filter(|address| !address.is_zero())
    }

    /// EIP-712 domain of disclosure statements.
    #[must_use]
    pub const fn disclosure_domain(&self) -> DisclosureDomain {
        DisclosureDomain {
            chain_id: self.gateway.gateway_chain_id,
            verifying_contract: self.gateway.decryption_contract,
        }
    }

    /// Retry policy built from the `retry` block.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    /// Whether the wallet being on `chain_id` lets the client proceed.
    #[must_use]
    pub const fn supports_chain(&self, chain_id: u64) -> bool {
        self.chain_id == chain_id
    }
}
