use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use coursemax_ledger::{query_stats, CommissionLedger, CommissionStats, LedgerError, StatsQuery};
use coursemax_metrics::RECEIPTS_CALCULATED;
use coursemax_pricing::{calculate_receipt, ReceiptOptions};
use coursemax_types::{CartLine, CommissionRecord, CommissionStatus, ReceiptBreakdown};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Checkout settlement: computes the receipt for an order and persists the
/// matching commission record in the same call, so later stats queries sum
/// stored records instead of recomputing receipts.
pub struct CheckoutService<L> {
    ledger: Arc<L>,
    options: ReceiptOptions,
}

impl<L> CheckoutService<L>
where
    L: CommissionLedger,
{
    pub fn new(ledger: Arc<L>, options: ReceiptOptions) -> Self {
        Self { ledger, options }
    }

    /// Price an order and write its commission record.
    pub async fn settle_order(
        &self,
        order_id: &str,
        driver_id: Option<&str>,
        items: &[CartLine],
        delivery_fee: Decimal,
        tip: Decimal,
    ) -> Result<ReceiptBreakdown, CheckoutError> {
        let receipt = calculate_receipt(items, delivery_fee, tip, &self.options);
        RECEIPTS_CALCULATED.inc();

        let record = CommissionRecord {
            id: format!("com-{}", Uuid::new_v4()),
            order_id: order_id.to_string(),
            driver_id: driver_id.map(|d| d.to_string()),
            delivery_fee,
            tip,
            platform_amount: receipt.admin_commission,
            driver_amount: receipt.driver_amount,
            commission_rate: self.options.admin_commission_rate,
            status: CommissionStatus::Pending,
            recorded_at: Utc::now().timestamp() as u64,
        };
        self.ledger.record(&record).await?;

        info!(
            order_id,
            grand_total = %receipt.grand_total_cents(),
            merchant = %receipt.merchant_amount,
            driver = %receipt.driver_amount,
            commission = %receipt.admin_commission,
            "order settled"
        );

        Ok(receipt)
    }

    /// Finalize the record once the delivery finishes.
    pub async fn mark_delivered(&self, order_id: &str) -> Result<(), CheckoutError> {
        self.ledger
            .update_status(order_id, CommissionStatus::Settled, Utc::now().timestamp() as u64)
            .await?;
        Ok(())
    }

    /// Void the record for a cancelled order.
    pub async fn mark_cancelled(&self, order_id: &str) -> Result<(), CheckoutError> {
        self.ledger
            .update_status(order_id, CommissionStatus::Cancelled, Utc::now().timestamp() as u64)
            .await?;
        Ok(())
    }

    /// Aggregate totals over persisted commission records.
    pub async fn stats(&self, query: &StatsQuery) -> Result<CommissionStats, CheckoutError> {
        Ok(query_stats(self.ledger.as_ref(), query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursemax_ledger::InMemoryLedger;
    use coursemax_types::CommissionStatus;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn cart() -> Vec<CartLine> {
        vec![
            CartLine::new("Pain", 2, dec("3.50")).unwrap(),
            CartLine::new("Lait", 1, dec("4.99")).unwrap(),
        ]
    }

    fn service() -> CheckoutService<InMemoryLedger> {
        CheckoutService::new(Arc::new(InMemoryLedger::new()), ReceiptOptions::default())
    }

    #[tokio::test]
    async fn test_settle_order_persists_record() {
        let checkout = service();
        let receipt = checkout
            .settle_order("order-1", Some("driver-a"), &cart(), dec("7.00"), Decimal::ZERO)
            .await
            .unwrap();

        assert_eq!(receipt.grand_total_cents(), dec("20.79"));

        let record = checkout
            .ledger
            .get_by_order("order-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.driver_amount, dec("7.00"));
        assert_eq!(record.platform_amount, Decimal::ZERO);
        assert_eq!(record.status, CommissionStatus::Pending);
        assert_eq!(record.driver_id.as_deref(), Some("driver-a"));
    }

    #[tokio::test]
    async fn test_double_settle_rejected() {
        let checkout = service();
        checkout
            .settle_order("order-1", None, &cart(), dec("7.00"), Decimal::ZERO)
            .await
            .unwrap();
        let err = checkout
            .settle_order("order-1", None, &cart(), dec("7.00"), Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Ledger(LedgerError::DuplicateOrder(_))
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_and_stats() {
        let checkout = service();
        checkout
            .settle_order("order-1", Some("driver-a"), &cart(), dec("7.00"), dec("2.00"))
            .await
            .unwrap();
        checkout
            .settle_order("order-2", Some("driver-b"), &cart(), dec("5.00"), Decimal::ZERO)
            .await
            .unwrap();
        checkout.mark_delivered("order-1").await.unwrap();
        checkout.mark_cancelled("order-2").await.unwrap();

        let stats = checkout
            .stats(&StatsQuery::between(0, u64::MAX))
            .await
            .unwrap();
        assert_eq!(stats.total_delivery_fees, dec("12.00"));
        assert_eq!(stats.driver_amount, dec("14.00"));
        assert_eq!(stats.counts_by_status[&CommissionStatus::Settled], 1);
        assert_eq!(stats.counts_by_status[&CommissionStatus::Cancelled], 1);
        assert_eq!(stats.top_drivers[0].driver_id, "driver-a");
    }
}
