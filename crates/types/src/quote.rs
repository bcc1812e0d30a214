use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ClientInfo, StoreInfo};

/// Priced delivery for a single distance, produced by the pricing engine.
///
/// Lives for the duration of the triggering request; it is only persisted if
/// explicitly attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    /// Driving distance, rounded to 2 decimal places.
    pub distance_km: Decimal,

    /// Delivery fee in currency units.
    pub delivery_fee: Decimal,

    /// Human-readable tier label, e.g. "3-6 km".
    pub pricing_tier: String,

    /// Informational only; never priced.
    pub estimated_duration_minutes: u32,
}

/// Delivery-fee request as received from the ordering frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryFeeRequest {
    pub store_id: String,
    pub client_address: String,
    pub client_city: String,
    pub client_postal_code: Option<String>,
}

/// Distance in both units for display purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceSummary {
    pub km: Decimal,
    pub meters: u64,
}

/// Duration in both units for display purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub minutes: u32,
    pub seconds: u64,
}

/// Full delivery-fee response returned to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryFeeResponse {
    pub calculation: DeliveryQuote,
    pub distance: DistanceSummary,
    pub estimated_duration: DurationSummary,
    pub store_info: StoreInfo,
    pub client_info: ClientInfo,
}
