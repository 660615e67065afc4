//! Message queues between the playback engine and the transport
//!
//! Each endpoint owns two of these: an outbound queue the engine pushes
//! into and an inbound queue the transport fills. `push` never blocks
//! (unbounded), `pop` parks the consuming task until work arrives, and
//! `clear` exists solely so a discard marker can drop every queued,
//! not-yet-applied message in one shot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::protocol::SyncMessage;

/// Unbounded FIFO of [`SyncMessage`], cloneable across tasks.
///
/// FIFO order is the only ordering guarantee. There is no priority and no
/// coalescing; the discard rule is applied by the consumer, not the queue.
#[derive(Clone, Default)]
pub struct MessageQueue {
    inner: Arc<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
    items: Mutex<VecDeque<SyncMessage>>,
    notify: Notify,
    cleared_total: AtomicU64,
}

impl MessageQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Never blocks.
    pub fn push(&self, msg: SyncMessage) {
        self.inner.items.lock().push_back(msg);
        self.inner.notify.notify_one();
    }

    /// Take the oldest message, waiting until one is available.
    pub async fn pop(&self) -> SyncMessage {
        loop {
            if let Some(msg) = self.try_pop() {
                return msg;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Take the oldest message if one is queued.
    pub fn try_pop(&self) -> Option<SyncMessage> {
        self.inner.items.lock().pop_front()
    }

    /// Drop every queued message, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut items = self.inner.items.lock();
        let removed = items.len();
        items.clear();
        self.inner
            .cleared_total
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }

    /// Total messages dropped by `clear` over the queue's lifetime.
    pub fn cleared_total(&self) -> u64 {
        self.inner.cleared_total.load(Ordering::Relaxed)
    }
}
