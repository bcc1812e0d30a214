use coursemax_types::{CommissionRecord, CommissionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::{CommissionLedger, LedgerError};

/// How many drivers the leaderboard keeps.
const TOP_DRIVER_COUNT: usize = 5;

/// Named reporting window ending at the query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl StatsPeriod {
    fn seconds(&self) -> u64 {
        match self {
            Self::Day => 86_400,
            Self::Week => 7 * 86_400,
            Self::Month => 30 * 86_400,
            Self::Year => 365 * 86_400,
        }
    }
}

/// A stats query: either a named period ending now or an explicit range,
/// optionally narrowed to one driver.
#[derive(Debug, Clone)]
pub struct StatsQuery {
    pub from: u64,
    pub to: u64,
    pub driver_id: Option<String>,
}

impl StatsQuery {
    pub fn for_period(period: StatsPeriod, now: u64) -> Self {
        Self {
            from: now.saturating_sub(period.seconds()),
            to: now,
            driver_id: None,
        }
    }

    pub fn between(from: u64, to: u64) -> Self {
        Self {
            from,
            to,
            driver_id: None,
        }
    }

    pub fn with_driver(mut self, driver_id: impl Into<String>) -> Self {
        self.driver_id = Some(driver_id.into());
        self
    }
}

/// One row of the driver leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverEarnings {
    pub driver_id: String,
    pub total_earned: Decimal,
    pub deliveries: u64,
}

/// Aggregate totals over a window of commission records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionStats {
    pub total_delivery_fees: Decimal,
    pub platform_amount: Decimal,
    pub driver_amount: Decimal,

    /// Mean commission rate across records, as a percentage.
    pub average_commission_pct: Decimal,

    pub counts_by_status: HashMap<CommissionStatus, u64>,

    /// Highest-earning drivers in the window, best first.
    pub top_drivers: Vec<DriverEarnings>,
}

/// Sum a window of records into aggregate stats. Pure; the async wrapper
/// below fetches the window from a ledger.
pub fn aggregate(records: &[CommissionRecord]) -> CommissionStats {
    let mut total_delivery_fees = Decimal::ZERO;
    let mut platform_amount = Decimal::ZERO;
    let mut driver_amount = Decimal::ZERO;
    let mut rate_sum = Decimal::ZERO;
    let mut counts_by_status: HashMap<CommissionStatus, u64> = HashMap::new();
    let mut by_driver: HashMap<String, DriverEarnings> = HashMap::new();

    for record in records {
        total_delivery_fees += record.delivery_fee;
        platform_amount += record.platform_amount;
        driver_amount += record.driver_amount;
        rate_sum += record.commission_rate;
        *counts_by_status.entry(record.status).or_insert(0) += 1;

        if let Some(driver_id) = &record.driver_id {
            let entry = by_driver
                .entry(driver_id.clone())
                .or_insert_with(|| DriverEarnings {
                    driver_id: driver_id.clone(),
                    total_earned: Decimal::ZERO,
                    deliveries: 0,
                });
            entry.total_earned += record.driver_amount;
            entry.deliveries += 1;
        }
    }

    let average_commission_pct = if records.is_empty() {
        Decimal::ZERO
    } else {
        rate_sum * Decimal::from(100) / Decimal::from(records.len() as u64)
    };

    let mut top_drivers: Vec<_> = by_driver.into_values().collect();
    top_drivers.sort_by(|a, b| {
        b.total_earned
            .cmp(&a.total_earned)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });
    top_drivers.truncate(TOP_DRIVER_COUNT);

    CommissionStats {
        total_delivery_fees,
        platform_amount,
        driver_amount,
        average_commission_pct,
        counts_by_status,
        top_drivers,
    }
}

/// Run a stats query against a ledger by summing the persisted records in
/// the window.
pub async fn query_stats<L: CommissionLedger>(
    ledger: &L,
    query: &StatsQuery,
) -> Result<CommissionStats, LedgerError> {
    let records = ledger
        .list_between(query.from, query.to, query.driver_id.as_deref())
        .await?;
    Ok(aggregate(&records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedger;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(
        order: &str,
        driver: &str,
        fee: &str,
        tip: &str,
        platform: &str,
        rate: &str,
        status: CommissionStatus,
        recorded_at: u64,
    ) -> CommissionRecord {
        let fee = dec(fee);
        let tip = dec(tip);
        CommissionRecord {
            id: format!("c-{order}"),
            order_id: order.to_string(),
            driver_id: Some(driver.to_string()),
            delivery_fee: fee,
            tip,
            platform_amount: dec(platform),
            driver_amount: fee + tip,
            commission_rate: dec(rate),
            status,
            recorded_at,
        }
    }

    #[test]
    fn test_aggregate_totals() {
        let records = vec![
            record("o1", "driver-a", "7.00", "2.00", "0.90", "0.10", CommissionStatus::Settled, 100),
            record("o2", "driver-b", "5.00", "0.00", "0.50", "0.10", CommissionStatus::Settled, 200),
            record("o3", "driver-a", "12.00", "3.00", "1.50", "0.10", CommissionStatus::Pending, 300),
        ];

        let stats = aggregate(&records);
        assert_eq!(stats.total_delivery_fees, dec("24.00"));
        assert_eq!(stats.platform_amount, dec("2.90"));
        assert_eq!(stats.driver_amount, dec("29.00"));
        assert_eq!(stats.average_commission_pct, dec("10"));
        assert_eq!(stats.counts_by_status[&CommissionStatus::Settled], 2);
        assert_eq!(stats.counts_by_status[&CommissionStatus::Pending], 1);
    }

    #[test]
    fn test_top_drivers_ordering() {
        let records = vec![
            record("o1", "driver-a", "7.00", "0.00", "0.00", "0", CommissionStatus::Settled, 100),
            record("o2", "driver-b", "12.00", "5.00", "0.00", "0", CommissionStatus::Settled, 200),
            record("o3", "driver-a", "5.00", "0.00", "0.00", "0", CommissionStatus::Settled, 300),
        ];

        let stats = aggregate(&records);
        assert_eq!(stats.top_drivers.len(), 2);
        assert_eq!(stats.top_drivers[0].driver_id, "driver-b");
        assert_eq!(stats.top_drivers[0].total_earned, dec("17.00"));
        assert_eq!(stats.top_drivers[1].driver_id, "driver-a");
        assert_eq!(stats.top_drivers[1].total_earned, dec("12.00"));
        assert_eq!(stats.top_drivers[1].deliveries, 2);
    }

    #[test]
    fn test_leaderboard_is_capped() {
        let records: Vec<_> = (0..8)
            .map(|i| {
                record(
                    &format!("o{i}"),
                    &format!("driver-{i}"),
                    "5.00",
                    "0.00",
                    "0.00",
                    "0",
                    CommissionStatus::Settled,
                    100,
                )
            })
            .collect();

        let stats = aggregate(&records);
        assert_eq!(stats.top_drivers.len(), TOP_DRIVER_COUNT);
    }

    #[test]
    fn test_empty_window() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_delivery_fees, Decimal::ZERO);
        assert_eq!(stats.average_commission_pct, Decimal::ZERO);
        assert!(stats.top_drivers.is_empty());
        assert!(stats.counts_by_status.is_empty());
    }

    #[test]
    fn test_period_windows() {
        let now = 1_000_000;
        let day = StatsQuery::for_period(StatsPeriod::Day, now);
        assert_eq!(day.from, now - 86_400);
        assert_eq!(day.to, now);

        let week = StatsQuery::for_period(StatsPeriod::Week, now);
        assert_eq!(week.from, now - 7 * 86_400);
    }

    #[tokio::test]
    async fn test_query_stats_sums_persisted_records() {
        let ledger = InMemoryLedger::new();
        ledger
            .record(&record("o1", "driver-a", "7.00", "1.00", "0.80", "0.10", CommissionStatus::Settled, 100))
            .await
            .unwrap();
        ledger
            .record(&record("o2", "driver-b", "5.00", "0.00", "0.50", "0.10", CommissionStatus::Settled, 5_000_000))
            .await
            .unwrap();

        let stats = query_stats(&ledger, &StatsQuery::between(0, 1_000)).await.unwrap();
        assert_eq!(stats.total_delivery_fees, dec("7.00"));

        let stats = query_stats(
            &ledger,
            &StatsQuery::between(0, 10_000_000).with_driver("driver-b"),
        )
        .await
        .unwrap();
        assert_eq!(stats.total_delivery_fees, dec("5.00"));
        assert_eq!(stats.top_drivers[0].driver_id, "driver-b");
    }
}
