use async_trait::async_trait;
use coursemax_types::{AssignmentStatus, AssignmentTransition, DriverAssignment};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("assignment not found: {0}")]
    NotFound(String),

    #[error("duplicate assignment ID: {0}")]
    DuplicateId(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════

/// Assignment storage - can be implemented for different backends.
///
/// The `try_*` operations are the contended path. Each one must be a single
/// atomic conditional write on the backend: the predicate and the mutation
/// happen together, and the return value says whether a row was affected.
/// Implementations must never check the predicate with a read and then
/// write, since that reintroduces the double-accept race.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Persist a new assignment.
    async fn create(&self, assignment: &DriverAssignment) -> Result<(), StoreError>;

    /// Fetch an assignment by ID.
    async fn get(&self, id: &str) -> Result<Option<DriverAssignment>, StoreError>;

    /// Atomically claim a pending, unexpired, unassigned batch for
    /// `driver_id`. Returns whether this call won.
    async fn try_accept(&self, id: &str, driver_id: &str, now: u64) -> Result<bool, StoreError>;

    /// Atomically finish an accepted delivery. Returns whether the row
    /// transitioned.
    async fn try_complete(&self, id: &str, now: u64) -> Result<bool, StoreError>;

    /// Atomically cancel a pending or accepted assignment. Terminal rows are
    /// untouched. Returns whether the row transitioned.
    async fn try_cancel(&self, id: &str, now: u64) -> Result<bool, StoreError>;

    /// Expire every pending assignment whose deadline has passed. Idempotent
    /// and safe to run concurrently with accepts and with itself. Returns
    /// the number of rows expired by this call.
    async fn expire_due(&self, now: u64) -> Result<u64, StoreError>;

    /// List assignments by status, oldest first.
    async fn list_by_status(
        &self,
        status: AssignmentStatus,
        limit: usize,
    ) -> Result<Vec<DriverAssignment>, StoreError>;

    /// List assignments claimed by a driver, oldest first.
    async fn list_by_driver(
        &self,
        driver_id: &str,
        limit: usize,
    ) -> Result<Vec<DriverAssignment>, StoreError>;

    /// Transition audit log for an assignment.
    async fn get_history(&self, id: &str) -> Result<Vec<AssignmentTransition>, StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE (for testing)
// ═══════════════════════════════════════════════════════════════════════════

/// Map-backed store. Conditional updates run under a single write lock, so
/// the compare-and-set contract holds the same way it does on a database
/// row.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    assignments: Arc<RwLock<HashMap<String, DriverAssignment>>>,
    transitions: Arc<RwLock<HashMap<String, Vec<AssignmentTransition>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            assignments: Arc::new(RwLock::new(HashMap::new())),
            transitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored assignments (for testing).
    pub fn len(&self) -> usize {
        self.assignments.read().unwrap().len()
    }

    /// Whether the store is empty (for testing).
    pub fn is_empty(&self) -> bool {
        self.assignments.read().unwrap().is_empty()
    }

    fn push_transition(&self, id: &str, transition: AssignmentTransition) {
        self.transitions
            .write()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(transition);
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn create(&self, assignment: &DriverAssignment) -> Result<(), StoreError> {
        let mut assignments = self.assignments.write().unwrap();
        if assignments.contains_key(&assignment.id) {
            return Err(StoreError::DuplicateId(assignment.id.clone()));
        }
        assignments.insert(assignment.id.clone(), assignment.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<DriverAssignment>, StoreError> {
        Ok(self.assignments.read().unwrap().get(id).cloned())
    }

    async fn try_accept(&self, id: &str, driver_id: &str, now: u64) -> Result<bool, StoreError> {
        let mut assignments = self.assignments.write().unwrap();
        let Some(assignment) = assignments.get_mut(id) else {
            return Ok(false);
        };

        let claimable = assignment.status == AssignmentStatus::Pending
            && assignment.assigned_driver_id.is_none()
            && now <= assignment.expires_at;
        if !claimable {
            return Ok(false);
        }

        assignment.status = AssignmentStatus::Accepted;
        assignment.assigned_driver_id = Some(driver_id.to_string());
        assignment.accepted_at = Some(now);
        assignment.updated_at = now;
        drop(assignments);

        self.push_transition(
            id,
            AssignmentTransition::new(AssignmentStatus::Pending, AssignmentStatus::Accepted, now)
                .with_driver(driver_id),
        );
        Ok(true)
    }

    async fn try_complete(&self, id: &str, now: u64) -> Result<bool, StoreError> {
        let mut assignments = self.assignments.write().unwrap();
        let Some(assignment) = assignments.get_mut(id) else {
            return Ok(false);
        };
        if assignment.status != AssignmentStatus::Accepted {
            return Ok(false);
        }

        assignment.status = AssignmentStatus::Completed;
        assignment.completed_at = Some(now);
        assignment.updated_at = now;
        drop(assignments);

        self.push_transition(
            id,
            AssignmentTransition::new(AssignmentStatus::Accepted, AssignmentStatus::Completed, now),
        );
        Ok(true)
    }

    async fn try_cancel(&self, id: &str, now: u64) -> Result<bool, StoreError> {
        let mut assignments = self.assignments.write().unwrap();
        let Some(assignment) = assignments.get_mut(id) else {
            return Ok(false);
        };
        if assignment.status.is_terminal() {
            return Ok(false);
        }

        let from_status = assignment.status;
        assignment.status = AssignmentStatus::Cancelled;
        assignment.updated_at = now;
        drop(assignments);

        self.push_transition(
            id,
            AssignmentTransition::new(from_status, AssignmentStatus::Cancelled, now),
        );
        Ok(true)
    }

    async fn expire_due(&self, now: u64) -> Result<u64, StoreError> {
        let mut assignments = self.assignments.write().unwrap();
        let mut expired_ids = Vec::new();
        for assignment in assignments.values_mut() {
            if assignment.status == AssignmentStatus::Pending && assignment.expires_at < now {
                assignment.status = AssignmentStatus::Expired;
                assignment.updated_at = now;
                expired_ids.push(assignment.id.clone());
            }
        }
        drop(assignments);

        for id in &expired_ids {
            self.push_transition(
                id,
                AssignmentTransition::new(AssignmentStatus::Pending, AssignmentStatus::Expired, now)
                    .with_details("expiry sweep"),
            );
        }
        Ok(expired_ids.len() as u64)
    }

    async fn list_by_status(
        &self,
        status: AssignmentStatus,
        limit: usize,
    ) -> Result<Vec<DriverAssignment>, StoreError> {
        let assignments = self.assignments.read().unwrap();
        let mut results: Vec<_> = assignments
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect();
        results.sort_by_key(|a| a.created_at);
        results.truncate(limit);
        Ok(results)
    }

    async fn list_by_driver(
        &self,
        driver_id: &str,
        limit: usize,
    ) -> Result<Vec<DriverAssignment>, StoreError> {
        let assignments = self.assignments.read().unwrap();
        let mut results: Vec<_> = assignments
            .values()
            .filter(|a| a.assigned_driver_id.as_deref() == Some(driver_id))
            .cloned()
            .collect();
        results.sort_by_key(|a| a.created_at);
        results.truncate(limit);
        Ok(results)
    }

    async fn get_history(&self, id: &str) -> Result<Vec<AssignmentTransition>, StoreError> {
        Ok(self
            .transitions
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn test_assignment(id: &str, created_at: u64, ttl: u64) -> DriverAssignment {
        DriverAssignment::new(
            id.to_string(),
            "store-1".to_string(),
            ["order-1", "order-2"].iter().map(|s| s.to_string()).collect(),
            ["driver-a", "driver-b", "driver-c"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            Decimal::from_str("34.50").unwrap(),
            ttl,
            created_at,
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let assignment = test_assignment("asg-1", 100, 900);

        store.create(&assignment).await.unwrap();

        let retrieved = store.get("asg-1").await.unwrap();
        assert_eq!(retrieved, Some(assignment));
    }

    #[tokio::test]
    async fn test_duplicate_id_error() {
        let store = InMemoryStore::new();
        let assignment = test_assignment("asg-1", 100, 900);

        store.create(&assignment).await.unwrap();
        let result = store.create(&assignment).await;

        assert!(matches!(result, Err(StoreError::DuplicateId(_))));
    }

    #[tokio::test]
    async fn test_accept_claims_pending_row() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();

        let won = store.try_accept("asg-1", "driver-a", 200).await.unwrap();
        assert!(won);

        let assignment = store.get("asg-1").await.unwrap().unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Accepted);
        assert_eq!(assignment.assigned_driver_id.as_deref(), Some("driver-a"));
        assert_eq!(assignment.accepted_at, Some(200));

        let history = store.get_history("asg-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].to_status, AssignmentStatus::Accepted);
        assert_eq!(history[0].driver_id.as_deref(), Some("driver-a"));
    }

    #[tokio::test]
    async fn test_second_accept_loses() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();

        assert!(store.try_accept("asg-1", "driver-a", 200).await.unwrap());
        assert!(!store.try_accept("asg-1", "driver-b", 201).await.unwrap());

        // The loser left no partial state behind.
        let assignment = store.get("asg-1").await.unwrap().unwrap();
        assert_eq!(assignment.assigned_driver_id.as_deref(), Some("driver-a"));
        assert_eq!(assignment.accepted_at, Some(200));
    }

    #[tokio::test]
    async fn test_accept_missing_row() {
        let store = InMemoryStore::new();
        assert!(!store.try_accept("asg-9", "driver-a", 200).await.unwrap());
    }

    #[tokio::test]
    async fn test_overdue_row_cannot_be_accepted_before_sweep() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();

        // Deadline is 1000; still pending but past due.
        assert!(!store.try_accept("asg-1", "driver-a", 1001).await.unwrap());
        let assignment = store.get("asg-1").await.unwrap().unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Pending);
        assert!(assignment.assigned_driver_id.is_none());
    }

    #[tokio::test]
    async fn test_accept_at_exact_deadline_succeeds() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();

        assert!(store.try_accept("asg-1", "driver-a", 1000).await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_due_sweeps_only_overdue_pending() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-old", 100, 400)).await.unwrap();
        store.create(&test_assignment("asg-fresh", 100, 5000)).await.unwrap();
        store.create(&test_assignment("asg-claimed", 100, 400)).await.unwrap();
        store.try_accept("asg-claimed", "driver-a", 300).await.unwrap();

        let expired = store.expire_due(1000).await.unwrap();
        assert_eq!(expired, 1);

        assert_eq!(
            store.get("asg-old").await.unwrap().unwrap().status,
            AssignmentStatus::Expired
        );
        assert_eq!(
            store.get("asg-fresh").await.unwrap().unwrap().status,
            AssignmentStatus::Pending
        );
        assert_eq!(
            store.get("asg-claimed").await.unwrap().unwrap().status,
            AssignmentStatus::Accepted
        );
    }

    #[tokio::test]
    async fn test_expire_due_is_idempotent() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 400)).await.unwrap();

        assert_eq!(store.expire_due(1000).await.unwrap(), 1);
        assert_eq!(store.expire_due(1000).await.unwrap(), 0);
        assert_eq!(store.expire_due(2000).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_complete_requires_accepted() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();

        assert!(!store.try_complete("asg-1", 300).await.unwrap());

        store.try_accept("asg-1", "driver-a", 200).await.unwrap();
        assert!(store.try_complete("asg-1", 300).await.unwrap());

        let assignment = store.get("asg-1").await.unwrap().unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Completed);
        assert_eq!(assignment.completed_at, Some(300));

        // Completed is terminal.
        assert!(!store.try_complete("asg-1", 400).await.unwrap());
        assert!(!store.try_cancel("asg-1", 400).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_from_pending_and_accepted() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();
        store.create(&test_assignment("asg-2", 100, 900)).await.unwrap();
        store.try_accept("asg-2", "driver-a", 200).await.unwrap();

        assert!(store.try_cancel("asg-1", 300).await.unwrap());
        assert!(store.try_cancel("asg-2", 300).await.unwrap());

        let history = store.get_history("asg-2").await.unwrap();
        assert_eq!(history.last().unwrap().from_status, AssignmentStatus::Accepted);
        assert_eq!(history.last().unwrap().to_status, AssignmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_expired_row_cannot_be_cancelled() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 400)).await.unwrap();
        store.expire_due(1000).await.unwrap();

        assert!(!store.try_cancel("asg-1", 1100).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_status_and_driver() {
        let store = InMemoryStore::new();
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();
        store.create(&test_assignment("asg-2", 200, 900)).await.unwrap();
        store.create(&test_assignment("asg-3", 300, 900)).await.unwrap();
        store.try_accept("asg-2", "driver-b", 400).await.unwrap();

        let pending = store
            .list_by_status(AssignmentStatus::Pending, 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "asg-1");

        let mine = store.list_by_driver("driver-b", 10).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "asg-2");
    }

    #[tokio::test]
    async fn test_concurrent_accepts_single_winner() {
        let store = Arc::new(InMemoryStore::new());
        store.create(&test_assignment("asg-1", 100, 900)).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .try_accept("asg-1", &format!("driver-{i}"), 200)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let assignment = store.get("asg-1").await.unwrap().unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Accepted);
        assert!(assignment.assigned_driver_id.is_some());
    }
}
