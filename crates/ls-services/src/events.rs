//! Feed invalidation events.

use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the feed event channel. Lagging receivers just reload once.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    /// Stored posts changed; the feed must be re-fetched.
    Dirty,
}

/// Broadcast bus between the post submitter and feed consumers.
#[derive(Debug, Clone)]
pub struct FeedEvents {
    tx: broadcast::Sender<FeedEvent>,
}

impl FeedEvents {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: FeedEvent) {
        if self.tx.send(event).is_err() {
            debug!(?event, "no feed listeners");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }
}

impl Default for FeedEvents {
    fn default() -> Self {
        Self::new()
    }
}
