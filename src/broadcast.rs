//! Broadcaster abstraction for per-tick frames
//!
//! Current implementation uses in-memory tokio broadcast channel.
//! Any other sink only has to hand out receivers of the same frames.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

use crate::config::BROADCAST_CAPACITY;
use crate::game::Snapshot;

/// Receiver type for broadcast frames
pub type FrameReceiver = broadcast::Receiver<Arc<Snapshot>>;

/// Trait for pushing frames to everyone watching a session
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Subscribe to receive frames
    fn subscribe(&self) -> FrameReceiver;

    /// Send a frame to all subscribers
    async fn send(&self, frame: Arc<Snapshot>);

    /// Get the number of active subscribers
    fn subscriber_count(&self) -> usize;
}

/// In-memory broadcaster using tokio broadcast channel
pub struct InMemoryBroadcaster {
    tx: broadcast::Sender<Arc<Snapshot>>,
}

impl InMemoryBroadcaster {
    /// Create a new in-memory broadcaster
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_CAPACITY)
    }

    /// Create with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for InMemoryBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broadcaster for InMemoryBroadcaster {
    fn subscribe(&self) -> FrameReceiver {
        self.tx.subscribe()
    }

    async fn send(&self, frame: Arc<Snapshot>) {
        // send() returns error if there are no receivers, which is fine
        if let Err(e) = self.tx.send(frame) {
            trace!("Frame dropped (no receivers): tick {}", e.0.tick);
        }
    }

    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
