use async_trait::async_trait;
use coursemax_types::{CommissionRecord, CommissionStatus};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

use crate::store::{CommissionLedger, LedgerError};

/// SQLite-backed commission ledger.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, LedgerError> {
        let url = format!("sqlite:{}", db_path.as_ref().display());
        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| LedgerError::ConnectionError(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;
        Ok(ledger)
    }

    /// In-memory database (for testing).
    ///
    /// Pinned to a single connection: every pooled connection to
    /// `sqlite::memory:` would otherwise get its own private database.
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| LedgerError::ConnectionError(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;
        Ok(ledger)
    }

    async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::query(include_str!("../migrations/001_create_commissions.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<CommissionRecord, LedgerError> {
        let parse_decimal = |column: &str| -> Result<Decimal, LedgerError> {
            Decimal::from_str(row.get::<String, _>(column).as_str())
                .map_err(|e| LedgerError::SerializationError(e.to_string()))
        };

        let status = CommissionStatus::from_str(row.get::<String, _>("status").as_str())
            .map_err(|e| LedgerError::SerializationError(e.to_string()))?;

        Ok(CommissionRecord {
            id: row.get("id"),
            order_id: row.get("order_id"),
            driver_id: row.get("driver_id"),
            delivery_fee: parse_decimal("delivery_fee")?,
            tip: parse_decimal("tip")?,
            platform_amount: parse_decimal("platform_amount")?,
            driver_amount: parse_decimal("driver_amount")?,
            commission_rate: parse_decimal("commission_rate")?,
            status,
            recorded_at: row.get::<i64, _>("recorded_at") as u64,
        })
    }
}

#[async_trait]
impl CommissionLedger for SqliteLedger {
    async fn record(&self, record: &CommissionRecord) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO commissions (
                id, order_id, driver_id, delivery_fee, tip,
                platform_amount, driver_amount, commission_rate,
                status, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.order_id)
        .bind(&record.driver_id)
        .bind(record.delivery_fee.to_string())
        .bind(record.tip.to_string())
        .bind(record.platform_amount.to_string())
        .bind(record.driver_amount.to_string())
        .bind(record.commission_rate.to_string())
        .bind(record.status.to_string())
        .bind(record.recorded_at as i64)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(LedgerError::DuplicateOrder(record.order_id.clone()))
            }
            Err(e) => Err(LedgerError::DatabaseError(e.to_string())),
        }
    }

    async fn get_by_order(&self, order_id: &str) -> Result<Option<CommissionRecord>, LedgerError> {
        let row = sqlx::query("SELECT * FROM commissions WHERE order_id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        row.map(|r| Self::row_to_record(&r)).transpose()
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: CommissionStatus,
        _now: u64,
    ) -> Result<(), LedgerError> {
        let result = sqlx::query("UPDATE commissions SET status = ? WHERE order_id = ?")
            .bind(status.to_string())
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(order_id.to_string()));
        }
        Ok(())
    }

    async fn list_between(
        &self,
        from: u64,
        to: u64,
        driver_id: Option<&str>,
    ) -> Result<Vec<CommissionRecord>, LedgerError> {
        let rows = match driver_id {
            Some(driver) => {
                sqlx::query(
                    r#"
                    SELECT * FROM commissions
                    WHERE recorded_at BETWEEN ? AND ? AND driver_id = ?
                    ORDER BY recorded_at ASC
                    "#,
                )
                .bind(from as i64)
                .bind(to as i64)
                .bind(driver)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM commissions
                    WHERE recorded_at BETWEEN ? AND ?
                    ORDER BY recorded_at ASC
                    "#,
                )
                .bind(from as i64)
                .bind(to as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;

        rows.iter().map(Self::row_to_record).collect()
    }
}
