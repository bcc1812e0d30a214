use async_trait::async_trait;
use coursemax_types::{AssignmentStatus, AssignmentTransition, DriverAssignment};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use crate::store::{AssignmentStore, StoreError};

// ═══════════════════════════════════════════════════════════════════════════
// SQLITE STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════

/// SQLite-backed assignment store.
///
/// The contended transitions are expressed as guarded `UPDATE` statements;
/// SQLite serializes writers, so `rows_affected` tells each caller whether
/// it won without any application-side locking.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path.
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}", db_path.as_ref().display());
        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// In-memory SQLite database (for testing).
    ///
    /// Pinned to a single connection: every pooled connection to
    /// `sqlite::memory:` would otherwise get its own private database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(include_str!("../migrations/001_create_assignments.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        sqlx::query(include_str!(
            "../migrations/002_create_assignment_transitions.sql"
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    fn row_to_assignment(row: &sqlx::sqlite::SqliteRow) -> Result<DriverAssignment, StoreError> {
        let status_str: String = row.get("status");
        let status = AssignmentStatus::from_str(&status_str)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let order_ids: BTreeSet<String> =
            serde_json::from_str(row.get::<String, _>("order_ids").as_str())
                .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        let available_driver_ids: BTreeSet<String> =
            serde_json::from_str(row.get::<String, _>("available_driver_ids").as_str())
                .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        let total_value = Decimal::from_str(row.get::<String, _>("total_value").as_str())
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        Ok(DriverAssignment {
            id: row.get("id"),
            store_id: row.get("store_id"),
            order_ids,
            available_driver_ids,
            assigned_driver_id: row.get("assigned_driver_id"),
            total_orders: row.get::<i64, _>("total_orders") as u32,
            total_value,
            status,
            expires_at: row.get::<i64, _>("expires_at") as u64,
            accepted_at: row.get::<Option<i64>, _>("accepted_at").map(|v| v as u64),
            completed_at: row.get::<Option<i64>, _>("completed_at").map(|v| v as u64),
            created_at: row.get::<i64, _>("created_at") as u64,
            updated_at: row.get::<i64, _>("updated_at") as u64,
        })
    }

    /// Append an audit row. Best effort; the guarded UPDATE is the source of
    /// truth and has already committed when this runs.
    async fn insert_transition(
        &self,
        assignment_id: &str,
        transition: &AssignmentTransition,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO assignment_transitions (
                assignment_id, from_status, to_status, timestamp, driver_id, details
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(assignment_id)
        .bind(transition.from_status.to_string())
        .bind(transition.to_status.to_string())
        .bind(transition.timestamp as i64)
        .bind(&transition.driver_id)
        .bind(&transition.details)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AssignmentStore for SqliteStore {
    async fn create(&self, assignment: &DriverAssignment) -> Result<(), StoreError> {
        let order_ids = serde_json::to_string(&assignment.order_ids)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        let driver_ids = serde_json::to_string(&assignment.available_driver_ids)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO assignments (
                id, store_id, order_ids, available_driver_ids, assigned_driver_id,
                total_orders, total_value, status,
                expires_at, accepted_at, completed_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&assignment.id)
        .bind(&assignment.store_id)
        .bind(&order_ids)
        .bind(&driver_ids)
        .bind(&assignment.assigned_driver_id)
        .bind(assignment.total_orders as i64)
        .bind(assignment.total_value.to_string())
        .bind(assignment.status.to_string())
        .bind(assignment.expires_at as i64)
        .bind(assignment.accepted_at.map(|v| v as i64))
        .bind(assignment.completed_at.map(|v| v as i64))
        .bind(assignment.created_at as i64)
        .bind(assignment.updated_at as i64)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateId(assignment.id.clone()))
            }
            Err(e) => Err(StoreError::DatabaseError(e.to_string())),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<DriverAssignment>, StoreError> {
        let row = sqlx::query("SELECT * FROM assignments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        row.map(|r| Self::row_to_assignment(&r)).transpose()
    }

    async fn try_accept(&self, id: &str, driver_id: &str, now: u64) -> Result<bool, StoreError> {
        // The race is decided here, in one statement.
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET status = 'accepted', assigned_driver_id = ?, accepted_at = ?, updated_at = ?
            WHERE id = ?
              AND status = 'pending'
              AND assigned_driver_id IS NULL
              AND expires_at >= ?
            "#,
        )
        .bind(driver_id)
        .bind(now as i64)
        .bind(now as i64)
        .bind(id)
        .bind(now as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let won = result.rows_affected() == 1;
        if won {
            self.insert_transition(
                id,
                &AssignmentTransition::new(
                    AssignmentStatus::Pending,
                    AssignmentStatus::Accepted,
                    now,
                )
                .with_driver(driver_id),
            )
            .await?;
        }
        Ok(won)
    }

    async fn try_complete(&self, id: &str, now: u64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET status = 'completed', completed_at = ?, updated_at = ?
            WHERE id = ? AND status = 'accepted'
            "#,
        )
        .bind(now as i64)
        .bind(now as i64)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let done = result.rows_affected() == 1;
        if done {
            self.insert_transition(
                id,
                &AssignmentTransition::new(
                    AssignmentStatus::Accepted,
                    AssignmentStatus::Completed,
                    now,
                ),
            )
            .await?;
        }
        Ok(done)
    }

    async fn try_cancel(&self, id: &str, now: u64) -> Result<bool, StoreError> {
        // Read first only to know the prior status for the audit row; the
        // guard below still decides whether the cancel lands.
        let prior = self.get(id).await?;

        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET status = 'cancelled', updated_at = ?
            WHERE id = ? AND status IN ('pending', 'accepted')
            "#,
        )
        .bind(now as i64)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let cancelled = result.rows_affected() == 1;
        if cancelled {
            let from_status = prior
                .map(|a| a.status)
                .unwrap_or(AssignmentStatus::Pending);
            self.insert_transition(
                id,
                &AssignmentTransition::new(from_status, AssignmentStatus::Cancelled, now),
            )
            .await?;
        }
        Ok(cancelled)
    }

    async fn expire_due(&self, now: u64) -> Result<u64, StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE assignments
            SET status = 'expired', updated_at = ?
            WHERE status = 'pending' AND expires_at < ?
            RETURNING id
            "#,
        )
        .bind(now as i64)
        .bind(now as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        for row in &rows {
            let id: String = row.get("id");
            self.insert_transition(
                &id,
                &AssignmentTransition::new(AssignmentStatus::Pending, AssignmentStatus::Expired, now)
                    .with_details("expiry sweep"),
            )
            .await?;
        }
        Ok(rows.len() as u64)
    }

    async fn list_by_status(
        &self,
        status: AssignmentStatus,
        limit: usize,
    ) -> Result<Vec<DriverAssignment>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM assignments WHERE status = ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(status.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        rows.iter().map(Self::row_to_assignment).collect()
    }

    async fn list_by_driver(
        &self,
        driver_id: &str,
        limit: usize,
    ) -> Result<Vec<DriverAssignment>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM assignments WHERE assigned_driver_id = ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(driver_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        rows.iter().map(Self::row_to_assignment).collect()
    }

    async fn get_history(&self, id: &str) -> Result<Vec<AssignmentTransition>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT from_status, to_status, timestamp, driver_id, details
            FROM assignment_transitions
            WHERE assignment_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let from_status =
                    AssignmentStatus::from_str(row.get::<String, _>("from_status").as_str())
                        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
                let to_status =
                    AssignmentStatus::from_str(row.get::<String, _>("to_status").as_str())
                        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
                Ok(AssignmentTransition {
                    from_status,
                    to_status,
                    timestamp: row.get::<i64, _>("timestamp") as u64,
                    driver_id: row.get("driver_id"),
                    details: row.get("details"),
                })
            })
            .collect()
    }
}
