use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// STATUS
// ═══════════════════════════════════════════════════════════════════════════

/// Lifecycle status of a driver assignment.
///
/// `Completed`, `Expired` and `Cancelled` are terminal; no transition leaves
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Completed,
    Expired,
    Cancelled,
}

impl AssignmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Cancelled)
    }

    /// Whether the state machine permits `self -> next`.
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Expired)
                | (Pending, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
        )
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
#[error("unknown assignment status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for AssignmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ASSIGNMENT
// ═══════════════════════════════════════════════════════════════════════════

/// A dispatch offer of ready orders at one store to a pool of eligible
/// drivers.
///
/// Orders are referenced by identifier only; the assignment does not own
/// their lifecycle. At most one driver ever transitions the assignment from
/// `Pending` to `Accepted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverAssignment {
    pub id: String,
    pub store_id: String,
    pub order_ids: BTreeSet<String>,
    pub available_driver_ids: BTreeSet<String>,
    pub assigned_driver_id: Option<String>,
    pub total_orders: u32,
    pub total_value: Decimal,
    pub status: AssignmentStatus,
    pub expires_at: u64,
    pub accepted_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl DriverAssignment {
    /// Create a pending assignment expiring `ttl_secs` after `created_at`.
    pub fn new(
        id: String,
        store_id: String,
        order_ids: BTreeSet<String>,
        available_driver_ids: BTreeSet<String>,
        total_value: Decimal,
        ttl_secs: u64,
        created_at: u64,
    ) -> Self {
        let total_orders = order_ids.len() as u32;
        Self {
            id,
            store_id,
            order_ids,
            available_driver_ids,
            assigned_driver_id: None,
            total_orders,
            total_value,
            status: AssignmentStatus::Pending,
            expires_at: created_at + ttl_secs,
            accepted_at: None,
            completed_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// A pending assignment is past due once `now` moves beyond
    /// `expires_at`; accepting at exactly `expires_at` still succeeds.
    pub fn is_past_due(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// Whether `driver_id` was offered this batch.
    pub fn is_eligible(&self, driver_id: &str) -> bool {
        self.available_driver_ids.contains(driver_id)
    }
}

/// Audit record of a single status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentTransition {
    pub from_status: AssignmentStatus,
    pub to_status: AssignmentStatus,
    pub timestamp: u64,
    pub driver_id: Option<String>,
    pub details: Option<String>,
}

impl AssignmentTransition {
    pub fn new(from_status: AssignmentStatus, to_status: AssignmentStatus, timestamp: u64) -> Self {
        Self {
            from_status,
            to_status,
            timestamp,
            driver_id: None,
            details: None,
        }
    }

    pub fn with_driver(mut self, driver_id: impl Into<String>) -> Self {
        self.driver_id = Some(driver_id.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Informational event fanned out to drivers. Carries no locking semantics;
/// receiving it grants nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssignmentEvent {
    /// A new batch is available for acceptance.
    BatchOffered {
        assignment_id: String,
        store_id: String,
        total_orders: u32,
        total_value: Decimal,
        expires_at: u64,
    },
    /// The batch was claimed; remaining drivers can stop considering it.
    BatchClaimed {
        assignment_id: String,
        driver_id: String,
    },
}
