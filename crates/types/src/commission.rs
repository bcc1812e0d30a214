use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Settlement status of a per-order commission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    /// Order placed, delivery not finished.
    Pending,
    /// Delivery finished, split is final.
    Settled,
    /// Order cancelled before settlement.
    Cancelled,
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
#[error("unknown commission status: {0}")]
pub struct ParseCommissionStatusError(String);

impl FromStr for CommissionStatus {
    type Err = ParseCommissionStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "settled" => Ok(Self::Settled),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseCommissionStatusError(other.to_string())),
        }
    }
}

/// Persisted per-order money split.
///
/// Stats queries sum these records; they never recompute receipts after the
/// fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: String,
    pub order_id: String,
    pub driver_id: Option<String>,
    pub delivery_fee: Decimal,
    pub tip: Decimal,
    pub platform_amount: Decimal,
    pub driver_amount: Decimal,
    pub commission_rate: Decimal,
    pub status: CommissionStatus,
    pub recorded_at: u64,
}

impl CommissionRecord {
    /// Percentage of the driver's take that the platform kept, as a ratio.
    /// Zero when the driver amount is zero.
    pub fn commission_pct(&self) -> Decimal {
        if self.driver_amount.is_zero() {
            Decimal::ZERO
        } else {
            self.platform_amount / self.driver_amount
        }
    }
}
