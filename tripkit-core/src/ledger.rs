//! Contract of the on-chain trip ledger.
//!
//! The ledger stores sealed envelopes next to the public title and style, and
//! folds each trip's encrypted night count into per-style aggregates. The
//! connection is bound to one account: "my" trips are the caller's.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use thiserror::Error;

use crate::gateway::Handle;
use crate::numeric::NumericCiphertext;
use crate::trip::TravelStyle;

/// Identifier of a stored trip, scoped to its owner.
pub type RecordId = u64;

/// Failure reported by a [`PlannerLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No trip with this id belongs to the caller.
    #[error("trip {0} not found")]
    NotFound(RecordId),
    /// The ledger refused the transaction.
    #[error("ledger rejected the transaction: {0}")]
    Rejected(String),
    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Everything written for one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSubmission {
    /// Sealed [`RoutePayload`](crate::trip::RoutePayload) envelope.
    pub route_ciphertext: Bytes,
    /// Sealed [`SchedulePayload`](crate::trip::SchedulePayload) envelope.
    pub schedule_ciphertext: Bytes,
    /// Public, trimmed title.
    pub title: String,
    /// Public style tag.
    pub style: TravelStyle,
    /// Encrypted night count, added to the style total.
    pub nights: NumericCiphertext,
    /// Encrypted constant 1, added to the style trip count.
    pub unit: NumericCiphertext,
}

/// A trip as read back by its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTrip {
    /// Sealed route envelope.
    pub route_ciphertext: Bytes,
    /// Sealed schedule envelope.
    pub schedule_ciphertext: Bytes,
    /// Unix timestamp of the block that stored the trip.
    pub created_at: u64,
    /// Public style tag.
    pub style: TravelStyle,
    /// Public title.
    pub title: String,
}

/// Public listing entry of one of the caller's trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSummary {
    /// Record identifier.
    pub id: RecordId,
    /// Public title.
    pub title: String,
    /// Unix timestamp of creation.
    pub created_at: u64,
    /// Public style tag.
    pub style: TravelStyle,
}

/// Encrypted aggregates of one style.
///
/// A zero handle means the aggregate was never written and reads as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleStatsHandles {
    /// Encrypted number of trips.
    pub trip_count: Handle,
    /// Encrypted sum of nights.
    pub total_nights: Handle,
}

/// The account-bound ledger connection.
#[async_trait]
pub trait PlannerLedger: Send + Sync {
    /// Writes a trip and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the write fails.
    async fn store_trip(&self, submission: TripSubmission) -> Result<RecordId, LedgerError>;

    /// Reads one of the caller's trips.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id.
    async fn get_my_trip(&self, id: RecordId) -> Result<StoredTrip, LedgerError>;

    /// Lists the caller's trips.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the read fails.
    async fn list_my_trips(&self) -> Result<Vec<TripSummary>, LedgerError>;

    /// Grants the caller decryption rights on the aggregates of `style`.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the write fails.
    async fn subscribe_to_style_stats(&self, style: TravelStyle) -> Result<(), LedgerError>;

    /// Reads the aggregate handles of `style`.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the read fails.
    async fn style_stats(&self, style: TravelStyle) -> Result<StyleStatsHandles, LedgerError>;
}
