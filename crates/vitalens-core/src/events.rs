//! Session change notifications

use serde::Serialize;
use tokio::sync::broadcast;

/// Default number of undelivered events a slow subscriber may fall behind
const DEFAULT_CAPACITY: usize = 16;

/// Authentication transitions, published after the store was updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

/// Typed publish/subscribe channel for [`SessionEvent`]s
///
/// Every subscriber receives every event published after it subscribed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: SessionEvent) {
        match self.sender.send(event) {
            Ok(receivers) => {
                log::debug!("[session] Published {:?} to {} subscriber(s)", event, receivers)
            }
            Err(_) => log::debug!("[session] Published {:?} with no subscribers", event),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
