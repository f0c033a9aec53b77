//! Connection lifecycle of a planner client.
//!
//! One linear state machine decides whether the planner may be used:
//! `Disconnected → NetworkUnsupported → FheInitializing → FheError → Ready`.

use crate::config::Config;

/// Where the client stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientStatus {
    /// No wallet connected.
    Disconnected,
    /// The wallet is on a chain without a planner deployment.
    NetworkUnsupported {
        /// Chain the wallet reported.
        chain_id: u64,
    },
    /// Waiting for the FHE client to load.
    FheInitializing,
    /// The FHE client failed to load.
    FheError(String),
    /// Everything is in place.
    Ready,
}

/// Inputs driving [`ClientLifecycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A wallet connected on `chain_id`.
    WalletConnected {
        /// Chain the wallet is on.
        chain_id: u64,
    },
    /// The connected wallet switched to `chain_id`.
    ChainChanged {
        /// New chain.
        chain_id: u64,
    },
    /// The wallet went away.
    WalletDisconnected,
    /// The FHE client finished loading.
    FheInitialized,
    /// The FHE client failed with a message.
    FheFailed(String),
    /// The user asked to load the FHE client again.
    RetryFhe,
}

/// Tracks [`ClientStatus`] for one deployment.
#[derive(Debug, Clone)]
pub struct ClientLifecycle {
    supported_chain_id: u64,
    status: ClientStatus,
}

impl ClientLifecycle {
    /// Starts disconnected, accepting the chain configured in `config`.
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            supported_chain_id: config.chain_id,
            status: ClientStatus::Disconnected,
        }
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &ClientStatus {
        &self.status
    }

    /// Whether planner calls may be issued.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.status, ClientStatus::Ready)
    }

    /// Applies `event` and returns the resulting status. Events that make no
    /// sense in the current status are ignored.
    pub fn apply(&mut self, event: ClientEvent) -> &ClientStatus {
        let next = match (&self.status, event) {
            (_, ClientEvent::WalletDisconnected) => Some(ClientStatus::Disconnected),
            (ClientStatus::Disconnected, ClientEvent::WalletConnected { chain_id }) => {
                Some(self.on_chain(chain_id))
            }
            (ClientStatus::Disconnected, ClientEvent::ChainChanged { .. }) => None,
            (
                ClientStatus::NetworkUnsupported { .. },
                ClientEvent::WalletConnected { chain_id } | ClientEvent::ChainChanged { chain_id },
            ) => Some(self.on_chain(chain_id)),
            (_, ClientEvent::WalletConnected { chain_id } | ClientEvent::ChainChanged { chain_id })
                if chain_id != self.supported_chain_id =>
            {
                Some(ClientStatus::NetworkUnsupported { chain_id })
            }
            (ClientStatus::FheInitializing, ClientEvent::FheInitialized) => Some(ClientStatus::Ready),
            (ClientStatus::FheInitializing, ClientEvent::FheFailed(message)) => {
                Some(ClientStatus::FheError(message))
            }
            (ClientStatus::FheError(_), ClientEvent::RetryFhe) => Some(ClientStatus::FheInitializing),
            _ => None,
        };
        if let Some(next) = next {
            if next != self.status {
                log::debug!("client status {:?} -> {next:?}", self.status);
                self.status = next;
            }
        }
        &self.status
    }

    const fn on_chain(&self, chain_id: u64) -> ClientStatus {
        if chain_id == self.supported_chain_id {
            ClientStatus::FheInitializing
        } else {
            ClientStatus::NetworkUnsupported { chain_id }
        }
    }
}
