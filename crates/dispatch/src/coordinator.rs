use chrono::Utc;
use coursemax_types::{AssignmentEvent, AssignmentStatus, DriverAssignment};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::notify::DriverNotifier;
use crate::store::AssignmentStore;

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How long a batch stays claimable, in seconds.
    pub default_ttl_secs: u64,

    /// Interval between expiry sweeps, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 900,   // 15 minutes
            sweep_interval_secs: 300, // 5 minutes
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════

/// Result of an acceptance attempt. Losing is an ordinary outcome, not an
/// error; only storage failures come back through `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// This driver claimed the batch.
    Accepted,
    /// Another driver already claimed it.
    AlreadyTaken,
    /// The offer lapsed before anyone claimed it.
    Expired,
    /// No assignment with that ID.
    NotFound,
}

impl AcceptOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COORDINATOR
// ═══════════════════════════════════════════════════════════════════════════

/// Orchestrates batch creation, driver fan-out and the accept-one-wins race.
pub struct AssignmentCoordinator<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    config: DispatchConfig,
}

impl<S, N> AssignmentCoordinator<S, N>
where
    S: AssignmentStore,
    N: DriverNotifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: DispatchConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    fn now() -> u64 {
        Utc::now().timestamp() as u64
    }

    /// Offer a batch of ready orders at one store to a pool of drivers.
    ///
    /// The assignment is persisted in `pending` before anyone hears about
    /// it; the notification fan-out afterwards is advisory and a delivery
    /// failure only logs.
    pub async fn create_assignment(
        &self,
        store_id: &str,
        order_ids: BTreeSet<String>,
        eligible_driver_ids: BTreeSet<String>,
        total_value: Decimal,
        ttl_secs: Option<u64>,
    ) -> Result<DriverAssignment, DispatchError> {
        if order_ids.is_empty() {
            return Err(DispatchError::EmptyBatch);
        }
        if eligible_driver_ids.is_empty() {
            return Err(DispatchError::NoEligibleDrivers(store_id.to_string()));
        }

        let now = Self::now();
        let ttl = ttl_secs.unwrap_or(self.config.default_ttl_secs);
        let id = format!("asg-{}", Uuid::new_v4());

        let assignment = DriverAssignment::new(
            id,
            store_id.to_string(),
            order_ids,
            eligible_driver_ids,
            total_value,
            ttl,
            now,
        );

        self.store.create(&assignment).await?;

        info!(
            assignment_id = %assignment.id,
            store_id,
            total_orders = assignment.total_orders,
            drivers = assignment.available_driver_ids.len(),
            expires_at = assignment.expires_at,
            "assignment created"
        );

        let drivers: Vec<String> = assignment.available_driver_ids.iter().cloned().collect();
        let event = AssignmentEvent::BatchOffered {
            assignment_id: assignment.id.clone(),
            store_id: assignment.store_id.clone(),
            total_orders: assignment.total_orders,
            total_value: assignment.total_value,
            expires_at: assignment.expires_at,
        };
        if let Err(e) = self.notifier.notify(&drivers, event).await {
            warn!(assignment_id = %assignment.id, error = %e, "driver fan-out failed");
        }

        Ok(assignment)
    }

    /// Attempt to claim the batch for `driver_id`.
    ///
    /// The race is decided by the store's single conditional write. When the
    /// write reports no row claimed, a follow-up read only classifies the
    /// loss for caller feedback; it plays no part in the decision.
    pub async fn accept_assignment(
        &self,
        assignment_id: &str,
        driver_id: &str,
    ) -> Result<AcceptOutcome, DispatchError> {
        let now = Self::now();

        if self.store.try_accept(assignment_id, driver_id, now).await? {
            info!(assignment_id, driver_id, "assignment accepted");

            let assignment = self.store.get(assignment_id).await?;
            if let Some(assignment) = assignment {
                let losers: Vec<String> = assignment
                    .available_driver_ids
                    .iter()
                    .filter(|d| d.as_str() != driver_id)
                    .cloned()
                    .collect();
                if !losers.is_empty() {
                    let event = AssignmentEvent::BatchClaimed {
                        assignment_id: assignment_id.to_string(),
                        driver_id: driver_id.to_string(),
                    };
                    if let Err(e) = self.notifier.notify(&losers, event).await {
                        warn!(assignment_id, error = %e, "claimed fan-out failed");
                    }
                }
            }
            return Ok(AcceptOutcome::Accepted);
        }

        match self.store.get(assignment_id).await? {
            None => Ok(AcceptOutcome::NotFound),
            Some(a) if a.status == AssignmentStatus::Expired => Ok(AcceptOutcome::Expired),
            Some(a) if a.status == AssignmentStatus::Pending && a.is_past_due(now) => {
                // Past due but the sweep has not visited it yet.
                Ok(AcceptOutcome::Expired)
            }
            Some(_) => Ok(AcceptOutcome::AlreadyTaken),
        }
    }

    /// Mark an accepted delivery as finished.
    pub async fn complete_assignment(&self, assignment_id: &str) -> Result<bool, DispatchError> {
        let done = self.store.try_complete(assignment_id, Self::now()).await?;
        if done {
            info!(assignment_id, "assignment completed");
        }
        Ok(done)
    }

    /// Cancel a pending or accepted assignment (operator or system action).
    pub async fn cancel_assignment(&self, assignment_id: &str) -> Result<bool, DispatchError> {
        let cancelled = self.store.try_cancel(assignment_id, Self::now()).await?;
        if cancelled {
            info!(assignment_id, "assignment cancelled");
        }
        Ok(cancelled)
    }

    /// Expire every overdue pending assignment. Idempotent; safe to run
    /// concurrently with accepts and with other sweeps.
    pub async fn expire_sweep(&self) -> Result<u64, DispatchError> {
        let expired = self.store.expire_due(Self::now()).await?;
        if expired > 0 {
            info!(expired, "expiry sweep transitioned assignments");
        }
        Ok(expired)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
