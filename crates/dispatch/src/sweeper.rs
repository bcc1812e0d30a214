use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::coordinator::AssignmentCoordinator;
use crate::notify::DriverNotifier;
use crate::store::AssignmentStore;

/// Spawn the periodic expiry sweep.
///
/// Runs `expire_sweep` on the coordinator's configured interval until the
/// returned handle is aborted. The sweep itself is idempotent, so overlap
/// with a concurrently running process is harmless.
pub fn spawn_expiry_sweeper<S, N>(
    coordinator: Arc<AssignmentCoordinator<S, N>>,
) -> JoinHandle<()>
where
    S: AssignmentStore + 'static,
    N: DriverNotifier + 'static,
{
    let interval = Duration::from_secs(coordinator.config().sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a freshly started
        // process does not sweep before its stores are warm.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = coordinator.expire_sweep().await {
                warn!(error = %e, "expiry sweep failed, will retry next interval");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::DispatchConfig;
    use crate::notify::NullNotifier;
    use crate::store::{AssignmentStore, InMemoryStore};
    use coursemax_types::{AssignmentStatus, DriverAssignment};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_sweeper_expires_overdue_assignments() {
        let store = Arc::new(InMemoryStore::new());
        let stale = DriverAssignment::new(
            "asg-stale".to_string(),
            "store-1".to_string(),
            ["order-1".to_string()].into_iter().collect(),
            ["driver-a".to_string()].into_iter().collect(),
            Decimal::ZERO,
            1,
            0,
        );
        store.create(&stale).await.unwrap();

        let coordinator = Arc::new(AssignmentCoordinator::new(
            store.clone(),
            Arc::new(NullNotifier),
            DispatchConfig {
                default_ttl_secs: 900,
                sweep_interval_secs: 1,
            },
        ));

        let handle = spawn_expiry_sweeper(coordinator);

        // Wait for at least one interval tick past the initial one.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.abort();

        let assignment = store.get("asg-stale").await.unwrap().unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Expired);
    }
}
