use coursemax_types::DeliveryQuote;
use rust_decimal::{Decimal, RoundingStrategy};

/// Distance above which the long-distance surcharge applies, in km.
const LONG_DISTANCE_THRESHOLD_KM: u32 = 15;

/// Surcharge added beyond the long-distance threshold, in cents.
const LONG_DISTANCE_SURCHARGE_CENTS: i64 = 200;

/// Label suffix appended when the surcharge applies.
const LONG_DISTANCE_SUFFIX: &str = " (bonus longue distance)";

/// One distance bracket of the fee schedule. `upper_km` is inclusive; a
/// distance of exactly 3 km lands in the 0-3 km tier.
struct Tier {
    upper_km: Option<u32>,
    fee_cents: i64,
    label: &'static str,
}

const TIERS: &[Tier] = &[
    Tier {
        upper_km: Some(3),
        fee_cents: 500,
        label: "0-3 km",
    },
    Tier {
        upper_km: Some(6),
        fee_cents: 700,
        label: "3-6 km",
    },
    Tier {
        upper_km: Some(10),
        fee_cents: 1000,
        label: "6-10 km",
    },
    Tier {
        upper_km: None,
        fee_cents: 1200,
        label: "10+ km",
    },
];

/// Compute the distance-tiered delivery fee.
///
/// Duration is passed through for display and never priced. Assumes
/// `distance_km >= 0`; a failed distance lookup must be handled upstream,
/// never fed in here as a default.
pub fn calculate_delivery_fee(distance_km: Decimal, duration_minutes: u32) -> DeliveryQuote {
    let tier = TIERS
        .iter()
        .find(|t| match t.upper_km {
            Some(upper) => distance_km <= Decimal::from(upper),
            None => true,
        })
        .unwrap_or(&TIERS[TIERS.len() - 1]);

    let mut fee = Decimal::new(tier.fee_cents, 2);
    let mut label = tier.label.to_string();

    if distance_km > Decimal::from(LONG_DISTANCE_THRESHOLD_KM) {
        fee += Decimal::new(LONG_DISTANCE_SURCHARGE_CENTS, 2);
        label.push_str(LONG_DISTANCE_SUFFIX);
    }

    DeliveryQuote {
        distance_km: distance_km
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        delivery_fee: fee,
        pricing_tier: label,
        estimated_duration_minutes: duration_minutes,
    }
}
