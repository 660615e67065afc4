//! Inbound message collection, one reader task per connection
//!
//! Each registered connection gets its own lightweight task looping on
//! `receive`, so an idle or slow peer never delays delivery from the
//! others. Per-connection FIFO order is preserved because a single task
//! owns each stream's read half.
//!
//! A discard marker is consumed here: instead of being enqueued, it clears
//! the destination queue of everything still pending, so stale position
//! updates queued before a seek are never applied.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::connection::Connection;
use super::registry::ConnectionRegistry;
use super::TransportStats;
use crate::queue::MessageQueue;

/// Spawns and owns the per-connection reader tasks.
pub struct Collector {
    registry: Arc<ConnectionRegistry>,
    inbound: MessageQueue,
    stats: Arc<TransportStats>,
    cancel: CancellationToken,
}

impl Collector {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        inbound: MessageQueue,
        stats: Arc<TransportStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            inbound,
            stats,
            cancel,
        }
    }

    /// Start a reader task for a newly registered connection. The task ends
    /// when the connection dies or the transport is cancelled; a dead
    /// connection removes itself from the registry on the way out.
    pub fn attach(&self, conn: Arc<Connection>) {
        let registry = Arc::clone(&self.registry);
        let inbound = self.inbound.clone();
        let stats = Arc::clone(&self.stats);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = conn.receive() => match result {
                        Ok(msg) => msg,
                        Err(e) => {
                            tracing::info!("Peer {} disconnected: {}", conn.peer_addr(), e);
                            if registry.remove(conn.id()).is_some() {
                                stats.record_peer_dropped();
                            }
                            conn.close().await;
                            break;
                        }
                    },
                };

                if msg.is_discard() {
                    let dropped = inbound.clear();
                    tracing::debug!(
                        "Discard marker from {}: dropped {} pending messages",
                        conn.peer_addr(),
                        dropped
                    );
                } else {
                    inbound.push(msg);
                    stats.record_received();
                }
            }
        });
    }
}
