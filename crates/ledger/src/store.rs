use async_trait::async_trait;
use coursemax_types::{CommissionRecord, CommissionStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("commission record not found for order: {0}")]
    NotFound(String),

    #[error("duplicate commission record for order: {0}")]
    DuplicateOrder(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),
}

/// Commission record storage - one record per order.
#[async_trait]
pub trait CommissionLedger: Send + Sync {
    /// Persist a new record. At most one record per order.
    async fn record(&self, record: &CommissionRecord) -> Result<(), LedgerError>;

    /// Fetch the record for an order.
    async fn get_by_order(&self, order_id: &str) -> Result<Option<CommissionRecord>, LedgerError>;

    /// Move a record to a new settlement status.
    async fn update_status(
        &self,
        order_id: &str,
        status: CommissionStatus,
        now: u64,
    ) -> Result<(), LedgerError>;

    /// Records whose `recorded_at` falls within `[from, to]`, optionally
    /// restricted to one driver, oldest first.
    async fn list_between(
        &self,
        from: u64,
        to: u64,
        driver_id: Option<&str>,
    ) -> Result<Vec<CommissionRecord>, LedgerError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY LEDGER (for testing)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: Arc<RwLock<HashMap<String, CommissionRecord>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

#[async_trait]
impl CommissionLedger for InMemoryLedger {
    async fn record(&self, record: &CommissionRecord) -> Result<(), LedgerError> {
        let mut records = self.records.write().unwrap();
        if records.contains_key(&record.order_id) {
            return Err(LedgerError::DuplicateOrder(record.order_id.clone()));
        }
        records.insert(record.order_id.clone(), record.clone());
        Ok(())
    }

    async fn get_by_order(&self, order_id: &str) -> Result<Option<CommissionRecord>, LedgerError> {
        Ok(self.records.read().unwrap().get(order_id).cloned())
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: CommissionStatus,
        _now: u64,
    ) -> Result<(), LedgerError> {
        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(order_id)
            .ok_or_else(|| LedgerError::NotFound(order_id.to_string()))?;
        record.status = status;
        Ok(())
    }

    async fn list_between(
        &self,
        from: u64,
        to: u64,
        driver_id: Option<&str>,
    ) -> Result<Vec<CommissionRecord>, LedgerError> {
        let records = self.records.read().unwrap();
        let mut results: Vec<_> = records
            .values()
            .filter(|r| r.recorded_at >= from && r.recorded_at <= to)
            .filter(|r| match driver_id {
                Some(d) => r.driver_id.as_deref() == Some(d),
                None => true,
            })
            .cloned()
            .collect();
        results.sort_by_key(|r| r.recorded_at);
        Ok(results)
    }
}
