use coursemax_types::{CartLine, ReceiptBreakdown, ReceiptLine};
use rust_decimal::Decimal;

/// Combined GST+QST rate for Quebec, the one region with explicit support,
/// expressed in ten-thousandths. Also the fallback when no location matches.
pub const QUEBEC_TAX_RATE_TEN_THOUSANDTHS: i64 = 1500;

/// Knobs for a receipt calculation. `Default` gives the Quebec flat rate and
/// no platform commission.
#[derive(Debug, Clone, Default)]
pub struct ReceiptOptions {
    /// Explicit tax rate; wins over location detection.
    pub tax_rate: Option<Decimal>,

    /// Platform commission rate over the grand total.
    pub admin_commission_rate: Decimal,

    /// Free-form location used to derive the tax rate when no explicit rate
    /// is given.
    pub location: Option<String>,
}

/// Resolve the effective tax rate: explicit rate, then location match, then
/// the flat default. Only one region is modeled; this is a single combined
/// rate, not a jurisdiction tax stack.
pub fn resolve_tax_rate(tax_rate: Option<Decimal>, location: Option<&str>) -> Decimal {
    if let Some(rate) = tax_rate {
        return rate;
    }
    let quebec = Decimal::new(QUEBEC_TAX_RATE_TEN_THOUSANDTHS, 4);
    if let Some(loc) = location {
        let loc = loc.to_lowercase();
        if loc.contains("quebec") || loc.contains("qc") {
            return quebec;
        }
    }
    // Unrecognized or absent locations fall back to the Quebec rate.
    quebec
}

/// Compute the full itemized breakdown and three-way split for an order.
///
/// Tax applies only to the product subtotal; the delivery fee and tip are
/// never taxed. Inputs are assumed validated (see `CartLine::new`); amounts
/// keep full precision and are rounded only at the display boundary.
pub fn calculate_receipt(
    items: &[CartLine],
    delivery_fee: Decimal,
    tip: Decimal,
    options: &ReceiptOptions,
) -> ReceiptBreakdown {
    let receipt_lines: Vec<ReceiptLine> = items
        .iter()
        .map(|line| ReceiptLine {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        })
        .collect();

    let subtotal: Decimal = receipt_lines.iter().map(|l| l.line_total).sum();
    let tax_rate = resolve_tax_rate(options.tax_rate, options.location.as_deref());
    let taxes = subtotal * tax_rate;

    let total_products = subtotal + taxes;
    let total_fees = delivery_fee + tip;
    let grand_total = total_products + total_fees;

    // The commission is taken over the grand total without being subtracted
    // from either share; at a nonzero rate the three amounts intentionally do
    // not partition grand_total. ReceiptBreakdown::balances surfaces this.
    let admin_commission = grand_total * options.admin_commission_rate;

    ReceiptBreakdown {
        items: receipt_lines,
        subtotal,
        taxes,
        delivery_fee,
        tip,
        total_products,
        total_fees,
        grand_total,
        merchant_amount: total_products,
        driver_amount: total_fees,
        admin_commission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_cart() -> Vec<CartLine> {
        vec![
            CartLine::new("Pain", 2, dec("3.50")).unwrap(),
            CartLine::new("Lait", 1, dec("4.99")).unwrap(),
        ]
    }

    #[test]
    fn test_bakery_order_breakdown() {
        let receipt = calculate_receipt(
            &sample_cart(),
            dec("7.00"),
            Decimal::ZERO,
            &ReceiptOptions::default(),
        );

        assert_eq!(receipt.subtotal, dec("11.99"));
        assert_eq!(receipt.taxes, dec("1.7985"));
        assert_eq!(receipt.total_products, dec("13.7885"));
        assert_eq!(receipt.total_fees, dec("7.00"));
        assert_eq!(receipt.grand_total, dec("20.7885"));
        assert_eq!(receipt.grand_total_cents(), dec("20.79"));
        assert_eq!(receipt.merchant_amount, dec("13.7885"));
        assert_eq!(receipt.driver_amount, dec("7.00"));
        assert_eq!(receipt.admin_commission, Decimal::ZERO);
    }

    #[test]
    fn test_split_balances_without_commission() {
        let receipt = calculate_receipt(
            &sample_cart(),
            dec("10.00"),
            dec("3.00"),
            &ReceiptOptions::default(),
        );
        assert_eq!(
            receipt.merchant_amount + receipt.driver_amount,
            receipt.grand_total
        );
        assert!(receipt.balances());
    }

    #[test]
    fn test_commission_is_not_subtracted_from_shares() {
        let options = ReceiptOptions {
            admin_commission_rate: dec("0.10"),
            ..ReceiptOptions::default()
        };
        let receipt = calculate_receipt(&sample_cart(), dec("7.00"), Decimal::ZERO, &options);

        assert_eq!(receipt.admin_commission, dec("2.07885"));
        // Merchant and driver shares are unchanged by the rate, so the
        // three-way partition does not hold at a nonzero rate.
        assert_eq!(receipt.merchant_amount, dec("13.7885"));
        assert_eq!(receipt.driver_amount, dec("7.00"));
        assert!(!receipt.balances());
    }

    #[test]
    fn test_tip_never_changes_taxes() {
        let no_tip = calculate_receipt(
            &sample_cart(),
            dec("7.00"),
            Decimal::ZERO,
            &ReceiptOptions::default(),
        );
        let big_tip = calculate_receipt(
            &sample_cart(),
            dec("7.00"),
            dec("50.00"),
            &ReceiptOptions::default(),
        );
        assert_eq!(no_tip.taxes, big_tip.taxes);
        assert_eq!(
            big_tip.grand_total - no_tip.grand_total,
            dec("50.00")
        );
    }

    #[test]
    fn test_delivery_fee_never_taxed() {
        let cheap = calculate_receipt(
            &sample_cart(),
            dec("5.00"),
            Decimal::ZERO,
            &ReceiptOptions::default(),
        );
        let far = calculate_receipt(
            &sample_cart(),
            dec("14.00"),
            Decimal::ZERO,
            &ReceiptOptions::default(),
        );
        assert_eq!(cheap.taxes, far.taxes);
    }

    #[test]
    fn test_explicit_tax_rate_wins() {
        let options = ReceiptOptions {
            tax_rate: Some(dec("0.05")),
            location: Some("Quebec".to_string()),
            ..ReceiptOptions::default()
        };
        let receipt = calculate_receipt(&sample_cart(), Decimal::ZERO, Decimal::ZERO, &options);
        assert_eq!(receipt.taxes, dec("11.99") * dec("0.05"));
    }

    #[test]
    fn test_location_detection_case_insensitive() {
        assert_eq!(resolve_tax_rate(None, Some("Montréal, QUEBEC")), dec("0.15"));
        assert_eq!(resolve_tax_rate(None, Some("Gatineau, qc")), dec("0.15"));
        assert_eq!(resolve_tax_rate(None, None), dec("0.15"));
    }

    #[test]
    fn test_empty_cart() {
        let receipt = calculate_receipt(&[], dec("5.00"), dec("2.00"), &ReceiptOptions::default());
        assert_eq!(receipt.subtotal, Decimal::ZERO);
        assert_eq!(receipt.taxes, Decimal::ZERO);
        assert_eq!(receipt.grand_total, dec("7.00"));
        assert_eq!(receipt.merchant_amount, Decimal::ZERO);
        assert_eq!(receipt.driver_amount, dec("7.00"));
    }

    #[test]
    fn test_idempotent() {
        let a = calculate_receipt(&sample_cart(), dec("7.00"), dec("1.50"), &ReceiptOptions::default());
        let b = calculate_receipt(&sample_cart(), dec("7.00"), dec("1.50"), &ReceiptOptions::default());
        assert_eq!(a, b);
    }
}
