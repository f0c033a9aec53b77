#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
//! Client-side cryptographic pipeline of the encrypted trip planner.
//!
//! Bulk trip details are sealed locally with [`SymmetricVault`]; numeric
//! statistics are turned into homomorphic ciphertexts by [`NumericEncryptor`]
//! through a remote [`CryptoGateway`]; reading encrypted counters back goes
//! through a signed, time-boxed grant issued by [`DecryptionAuthorizer`].

mod config;
pub use config::*;

mod error;
pub use error::*;

pub mod authorization;
pub use authorization::{DecryptionAuthorization, DecryptionAuthorizer};

pub mod gateway;
pub use gateway::{CryptoGateway, GatewayError, GatewayErrorKind, Handle};

pub mod ledger;
pub use ledger::PlannerLedger;

pub mod logger;

mod numeric;
pub use numeric::*;

mod planner;
pub use planner::*;

mod retry;
pub use retry::*;

pub mod signer;
pub use signer::{Signer, SignerError};

mod status;
pub use status::*;

pub mod storage;

pub mod trip;

pub mod vault;
pub use vault::{EncryptedEnvelope, SymmetricKey, SymmetricVault};

#[cfg(test)]
#[allow(dead_code, reason = "not every unit test uses every fake")]
mod test_support;
