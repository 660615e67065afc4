//! Network subsystem for the TCP sync transport

pub mod broadcaster;
pub mod collector;
pub mod connection;
pub mod listener;
pub mod registry;

#[cfg(feature = "master")]
pub mod master;
#[cfg(feature = "slave")]
pub mod slave;

pub use broadcaster::Broadcaster;
pub use collector::Collector;
pub use connection::Connection;
pub use listener::Listener;
pub use registry::ConnectionRegistry;

#[cfg(feature = "master")]
pub use master::MasterTransport;
#[cfg(feature = "slave")]
pub use slave::PeerLink;

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared transport counters, updated by the role loops.
#[derive(Debug, Default)]
pub struct TransportStats {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    peers_dropped: AtomicU64,
}

impl TransportStats {
    pub(crate) fn record_sent(&self, n: u64) {
        self.messages_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_peer_dropped(&self) {
        self.peers_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Messages successfully written to peers.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Messages delivered to the inbound queue.
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Connections dropped after a send or receive failure.
    pub fn peers_dropped(&self) -> u64 {
        self.peers_dropped.load(Ordering::Relaxed)
    }
}
