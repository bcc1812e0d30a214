use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One itemized row of a receipt, derived from a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Itemized receipt with the three-way merchant/driver/platform split.
///
/// Amounts are kept at full precision; round to cents at the display
/// boundary with [`round_cents`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptBreakdown {
    pub items: Vec<ReceiptLine>,

    /// Sum of line totals before tax.
    pub subtotal: Decimal,

    /// Tax on the product subtotal only. Delivery fee and tip are never
    /// taxed.
    pub taxes: Decimal,

    pub delivery_fee: Decimal,
    pub tip: Decimal,

    /// subtotal + taxes.
    pub total_products: Decimal,

    /// delivery_fee + tip.
    pub total_fees: Decimal,

    /// total_products + total_fees.
    pub grand_total: Decimal,

    /// What the merchant receives: exactly the taxed product value.
    pub merchant_amount: Decimal,

    /// What the driver receives: exactly the delivery fee plus tip.
    pub driver_amount: Decimal,

    /// grand_total × commission rate, computed independently of the other
    /// two shares. For a nonzero rate the three amounts do not partition
    /// grand_total; see `balances`.
    pub admin_commission: Decimal,
}

impl ReceiptBreakdown {
    /// Whether merchant + driver + commission partitions the grand total to
    /// within one cent. Holds exactly when the commission rate is zero.
    pub fn balances(&self) -> bool {
        let split = self.merchant_amount + self.driver_amount + self.admin_commission;
        (split - self.grand_total).abs() <= Decimal::new(1, 2)
    }

    /// Grand total rounded to cents for display.
    pub fn grand_total_cents(&self) -> Decimal {
        round_cents(self.grand_total)
    }
}

/// Round to 2 decimal places, half away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
