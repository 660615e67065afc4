//! Master endpoint wiring
//!
//! The master owns the authoritative playback state. Its engine pushes
//! position updates and transport commands into the outbound queue; the
//! broadcaster fans them out to every connected slave. Control requests
//! from slaves arrive on the inbound queue.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::broadcaster::Broadcaster;
use super::collector::Collector;
use super::listener::Listener;
use super::registry::ConnectionRegistry;
use super::TransportStats;
use crate::config::NetworkConfig;
use crate::error::Result;
use crate::protocol::SyncMessage;
use crate::queue::MessageQueue;

/// The running master-side transport: listener, broadcaster, and one
/// collector task per connected peer, all under a single cancel token.
pub struct MasterTransport {
    outbound: MessageQueue,
    inbound: MessageQueue,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<TransportStats>,
    local_addr: SocketAddr,
    cancel: CancellationToken,
}

impl MasterTransport {
    /// Bind the listen socket and start all role loops. Bind failure is
    /// fatal and surfaces here, before any loop runs.
    pub async fn start(config: &NetworkConfig) -> Result<Self> {
        let listener = Listener::bind(config.endpoint()).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Master transport listening on {}", local_addr);

        let outbound = MessageQueue::new();
        let inbound = MessageQueue::new();
        let registry = Arc::new(ConnectionRegistry::new());
        let stats = Arc::new(TransportStats::default());
        let cancel = CancellationToken::new();

        let collector = Collector::new(
            Arc::clone(&registry),
            inbound.clone(),
            Arc::clone(&stats),
            cancel.clone(),
        );
        tokio::spawn(listener.run(Arc::clone(&registry), collector, cancel.clone()));

        let broadcaster = Broadcaster::new(
            Arc::clone(&registry),
            outbound.clone(),
            Arc::clone(&stats),
            cancel.clone(),
        );
        tokio::spawn(broadcaster.run());

        Ok(Self {
            outbound,
            inbound,
            registry,
            stats,
            local_addr,
            cancel,
        })
    }

    /// Queue a message for broadcast to every connected slave.
    pub fn enqueue_outbound(&self, msg: SyncMessage) {
        self.outbound.push(msg);
    }

    /// Wait for the next control request from any slave.
    pub async fn dequeue_inbound(&self) -> SyncMessage {
        self.inbound.pop().await
    }

    /// Take a pending control request without waiting.
    pub fn try_dequeue_inbound(&self) -> Option<SyncMessage> {
        self.inbound.try_pop()
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently connected slaves.
    pub fn peer_count(&self) -> usize {
        self.registry.len()
    }

    /// Transport counters.
    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Stop all role loops and close every peer socket. The transport
    /// cannot be restarted; build a new one instead.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        for conn in self.registry.snapshot() {
            self.registry.remove(conn.id());
            conn.close().await;
        }
        tracing::info!("Master transport shut down");
    }
}
