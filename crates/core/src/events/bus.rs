use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::AdminEvent;

/// Fans save progress out to whatever admin screens are listening.
///
/// Emitting never fails the save: with nobody listening the event is
/// dropped, and a listener that falls more than `capacity` events behind
/// skips ahead.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: Arc<broadcast::Sender<AdminEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx: Arc::new(tx) }
    }

    /// Emit `event`, returning how many listeners will see it.
    pub fn notify(&self, event: AdminEvent) -> usize {
        match self.tx.send(event) {
            Ok(listeners) => listeners,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "admin event dropped, no listeners");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdminEvent> {
        self.tx.subscribe()
    }

    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
