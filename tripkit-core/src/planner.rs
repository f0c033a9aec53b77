//! End-to-end submit and reveal flows of the trip planner.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};

use crate::authorization::{DecryptionAuthorizer, SessionStore};
use crate::config::Config;
use crate::error::{TripKitError, TripKitResult};
use crate::gateway::{CryptoGateway, GatewayError, GatewayErrorKind, Handle};
use crate::ledger::{PlannerLedger, RecordId, TripSubmission, TripSummary};
use crate::numeric::NumericEncryptor;
use crate::signer::Signer;
use crate::trip::{RoutePayload, SchedulePayload, TravelStyle, TripForm};
use crate::vault::SymmetricVault;

/// A trip decrypted for its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedTrip {
    /// Record identifier.
    pub id: RecordId,
    /// Public title.
    pub title: String,
    /// Public style tag.
    pub style: TravelStyle,
    /// Decrypted route.
    pub route: RoutePayload,
    /// Decrypted schedule.
    pub schedule: SchedulePayload,
    /// Unix timestamp of creation.
    pub created_at: u64,
}

impl RevealedTrip {
    /// Creation time as a calendar timestamp, if representable.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.created_at)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Decrypted aggregates of one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleInsight {
    /// The style the numbers belong to.
    pub style: TravelStyle,
    /// Number of trips filed under the style.
    pub trips: u64,
    /// Total nights across those trips.
    pub nights: u64,
}

/// Drives the planner contract for the connected account.
pub struct TripPlanner {
    contract: Address,
    vault: Arc<SymmetricVault>,
    encryptor: NumericEncryptor,
    authorizer: DecryptionAuthorizer,
    gateway: Arc<dyn CryptoGateway>,
    ledger: Arc<dyn PlannerLedger>,
    sessions: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for TripPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripPlanner")
            .field("contract", &self.contract)
            .field("vault", &self.vault)
            .field("encryptor", &self.encryptor)
            .field("authorizer", &self.authorizer)
            .finish_non_exhaustive()
    }
}

impl TripPlanner {
    /// Wires the planner for the deployment described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::InvalidArgument`] if `config` has no planner
    /// address for its chain.
    pub fn new(
        config: &Config,
        vault: Arc<SymmetricVault>,
        gateway: Arc<dyn CryptoGateway>,
        ledger: Arc<dyn PlannerLedger>,
        sessions: Arc<dyn SessionStore>,
    ) -> TripKitResult<Self> {
        let contract = config.planner_address().ok_or_else(|| {
            TripKitError::invalid_argument(
                "planner_address",
                format!("planner contract not deployed on chain {}", config.chain_id),
            )
        })?;
        Ok(Self {
            contract,
            vault,
            encryptor: NumericEncryptor::new(config.retry_policy()),
            authorizer: DecryptionAuthorizer::from_config(config),
            gateway,
            ledger,
            sessions,
        })
    }

    /// Address of the planner contract.
    #[must_use]
    pub const fn contract(&self) -> Address {
        self.contract
    }

    /// Seals `form` and stores it for `signer`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid form, a vault error, an encryption failure or a
    /// ledger error. Nothing is written unless every ciphertext was produced.
    pub async fn submit_trip(&self, form: &TripForm, signer: &dyn Signer) -> TripKitResult<RecordId> {
        self.submit_trip_at(form, signer, Utc::now()).await
    }

    /// [`TripPlanner::submit_trip`] with an explicit capture time for the
    /// schedule payload.
    ///
    /// # Errors
    ///
    /// See [`TripPlanner::submit_trip`].
    pub async fn submit_trip_at(
        &self,
        form: &TripForm,
        signer: &dyn Signer,
        captured_at: DateTime<Utc>,
    ) -> TripKitResult<RecordId> {
        let title = form.submission_title()?;
        let nights = form.nights()?;
        let owner = signer.address();

        let route_ciphertext = Bytes::from(self.vault.encrypt_to_bytes(&form.route_payload())?);
        let schedule_ciphertext =
            Bytes::from(self.vault.encrypt_to_bytes(&form.schedule_payload(captured_at))?);

        let gateway = self.gateway.as_ref();
        let (nights, unit) = tokio::try_join!(
            self.encryptor
                .encrypt_uint32(gateway, self.contract, Some(owner), u64::from(nights)),
            self.encryptor
                .encrypt_uint32(gateway, self.contract, Some(owner), 1),
        )?;

        let id = self
            .ledger
            .store_trip(TripSubmission {
                route_ciphertext,
                schedule_ciphertext,
                title,
                style: form.style,
                nights,
                unit,
            })
            .await?;
        log::info!("stored trip {id} for {owner}");
        Ok(id)
    }

    /// Reads and decrypts trip `id` for `signer`.
    ///
    /// The decryption authorization is confirmed before the ledger is read.
    ///
    /// # Errors
    ///
    /// Fails if authorization is refused, the trip is unknown or an envelope
    /// does not open.
    pub async fn reveal_trip(&self, id: RecordId, signer: &dyn Signer) -> TripKitResult<RevealedTrip> {
        self.authorizer
            .load_or_sign(
                self.gateway.as_ref(),
                &[self.contract],
                signer,
                self.sessions.as_ref(),
            )
            .await?;

        let stored = self.ledger.get_my_trip(id).await?;
        let route = self.vault.decrypt(&stored.route_ciphertext)?;
        let schedule = self.vault.decrypt(&stored.schedule_ciphertext)?;
        Ok(RevealedTrip {
            id,
            title: stored.title,
            style: stored.style,
            route,
            schedule,
            created_at: stored.created_at,
        })
    }

    /// Lists the caller's trips, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::Ledger`] if the ledger read fails.
    pub async fn list_trips(&self) -> TripKitResult<Vec<TripSummary>> {
        let mut trips = self.ledger.list_my_trips().await?;
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(trips)
    }

    /// Asks the ledger to let the caller decrypt the aggregates of `style`.
    ///
    /// # Errors
    ///
    /// Returns [`TripKitError::Ledger`] if the ledger write fails.
    pub async fn grant_style_access(&self, style: TravelStyle) -> TripKitResult<()> {
        self.ledger.subscribe_to_style_stats(style).await?;
        log::debug!("subscribed to {} statistics", style.label());
        Ok(())
    }

    /// Decrypts the aggregates of `style` for `signer`.
    ///
    /// # Errors
    ///
    /// Fails on ledger errors, authorization errors, or a gateway answer that
    /// does not fit the counters.
    pub async fn reveal_style_stats(
        &self,
        style: TravelStyle,
        signer: &dyn Signer,
    ) -> TripKitResult<StyleInsight> {
        let stats = self.ledger.style_stats(style).await?;
        let written: Vec<Handle> = [stats.trip_count, stats.total_nights]
            .into_iter()
            .filter(|handle| !handle.is_zero())
            .collect();

        let revealed = self
            .authorizer
            .decrypt_handles(
                self.gateway.as_ref(),
                self.contract,
                signer,
                self.sessions.as_ref(),
                &written,
            )
            .await?;
        let read = |handle: &Handle| -> TripKitResult<u64> {
            revealed
                .get(handle)
                .copied()
                .map_or(Ok(0), counter_value)
        };
        Ok(StyleInsight {
            style,
            trips: read(&stats.trip_count)?,
            nights: read(&stats.total_nights)?,
        })
    }
}

fn counter_value(value: U256) -> TripKitResult<u64> {
    u64::try_from(value).map_err(|_| {
        GatewayError::new(
            GatewayErrorKind::MalformedResponse,
            format!("decrypted counter {value} exceeds 64 bits"),
        )
        .into()
    })
}
