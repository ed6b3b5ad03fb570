use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// The single event published on the history topic. It carries no payload;
/// receivers re-read persisted state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HistoryEvent {
    HistoryUpdated,
}

/// Best-effort publish/subscribe channel between contexts of one client.
pub trait Notifier: Send + Sync {
    fn publish(&self, event: HistoryEvent);
    fn subscribe(&self) -> broadcast::Receiver<HistoryEvent>;
}

/// Notifier over a tokio broadcast channel. Clones publish to the same
/// subscribers.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<HistoryEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: HistoryEvent) {
        // no subscribers is not an error for a best-effort channel
        let _ = self.sender.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.sender.subscribe()
    }
}
