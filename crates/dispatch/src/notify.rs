use async_trait::async_trait;
use coursemax_types::AssignmentEvent;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Fan-out of informational dispatch events to drivers.
///
/// Purely advisory: receiving an event grants nothing, and losing one costs
/// nothing but a delayed discovery. The acceptance race is decided at the
/// store, never here.
#[async_trait]
pub trait DriverNotifier: Send + Sync {
    async fn notify(&self, driver_ids: &[String], event: AssignmentEvent)
        -> Result<(), NotifyError>;
}

/// One delivered notification: which driver it addresses and what happened.
#[derive(Debug, Clone)]
pub struct DriverNotification {
    pub driver_id: String,
    pub event: AssignmentEvent,
}

// ═══════════════════════════════════════════════════════════════════════════
// BROADCAST NOTIFIER
// ═══════════════════════════════════════════════════════════════════════════

/// Notifier backed by a tokio broadcast channel. Each subscriber (a push
/// gateway, a websocket session manager) filters by driver ID.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<DriverNotification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DriverNotification> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl DriverNotifier for BroadcastNotifier {
    async fn notify(
        &self,
        driver_ids: &[String],
        event: AssignmentEvent,
    ) -> Result<(), NotifyError> {
        for driver_id in driver_ids {
            let notification = DriverNotification {
                driver_id: driver_id.clone(),
                event: event.clone(),
            };
            // A send error just means nobody is listening right now, which
            // is fine for advisory events.
            if self.tx.send(notification).is_err() {
                tracing::debug!(driver_id, "no active notification subscribers");
            }
        }
        Ok(())
    }
}

/// Notifier that drops everything. For tools and tests that do not care
/// about fan-out.
#[derive(Debug, Clone, Default)]
pub struct NullNotifier;

#[async_trait]
impl DriverNotifier for NullNotifier {
    async fn notify(
        &self,
        _driver_ids: &[String],
        _event: AssignmentEvent,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}
