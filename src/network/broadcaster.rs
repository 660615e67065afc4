//! Fan-out of outbound messages to every registered peer
//!
//! One broadcast round: take one message off the outbound queue, snapshot
//! the registry, and send to every peer concurrently under a fixed permit
//! limit. The round completes (every send finished or failed) before the
//! next queue item is taken; there is no pipelining across rounds. A failed
//! send drops the peer from the registry and is never retried.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::connection::Connection;
use super::registry::ConnectionRegistry;
use super::TransportStats;
use crate::constants::FANOUT_WORKERS;
use crate::protocol::SyncMessage;
use crate::queue::MessageQueue;

/// Drains the outbound queue and fans each message out to all peers.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    outbound: MessageQueue,
    permits: Arc<Semaphore>,
    stats: Arc<TransportStats>,
    cancel: CancellationToken,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        outbound: MessageQueue,
        stats: Arc<TransportStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            outbound,
            // One long-lived pool of permits, reused across rounds
            permits: Arc::new(Semaphore::new(FANOUT_WORKERS)),
            stats,
            cancel,
        }
    }

    /// Run until cancelled.
    pub async fn run(self) {
        loop {
            let msg = tokio::select! {
                _ = self.cancel.cancelled() => break,
                msg = self.outbound.pop() => msg,
            };
            self.broadcast(&msg).await;
        }
        tracing::debug!("Broadcaster stopped");
    }

    /// One full broadcast round for a single message.
    async fn broadcast(&self, msg: &SyncMessage) {
        let peers = self.registry.snapshot();
        if peers.is_empty() {
            return;
        }

        let sends = peers.into_iter().map(|conn| self.send_one(conn, msg));
        let failed: Vec<Arc<Connection>> =
            join_all(sends).await.into_iter().flatten().collect();

        for conn in failed {
            if self.registry.remove(conn.id()).is_some() {
                self.stats.record_peer_dropped();
                tracing::warn!("Dropping peer {} after send failure", conn.peer_addr());
            }
            conn.close().await;
        }
    }

    /// Send to one peer under a fan-out permit. Returns the connection if
    /// the send failed so the round can deregister it.
    async fn send_one(
        &self,
        conn: Arc<Connection>,
        msg: &SyncMessage,
    ) -> Option<Arc<Connection>> {
        // The semaphore is never closed, so acquire only fails on shutdown
        // races; treat that as a skipped send.
        let _permit = self.permits.acquire().await.ok()?;

        match conn.send(msg).await {
            Ok(()) => {
                self.stats.record_sent(1);
                None
            }
            Err(e) => {
                tracing::debug!("Send to {} failed: {}", conn.peer_addr(), e);
                Some(conn)
            }
        }
    }
}
