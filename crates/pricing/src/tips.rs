use coursemax_types::round_cents;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The three tip amounts offered at checkout, each rounded to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TipSuggestions {
    pub ten_percent: Decimal,
    pub fifteen_percent: Decimal,
    pub twenty_percent: Decimal,
}

/// Suggest 10%, 15% and 20% of `amount`, rounded half away from zero at the
/// cent.
pub fn suggested_tips(amount: Decimal) -> TipSuggestions {
    let pct = |num: i64| round_cents(amount * Decimal::new(num, 2));
    TipSuggestions {
        ten_percent: pct(10),
        fifteen_percent: pct(15),
        twenty_percent: pct(20),
    }
}
