//! Slave endpoint: a single link to the master
//!
//! The slave mirrors the master's playback state. Its receive loop feeds
//! state updates into the inbound queue (honoring the discard rule), and
//! its send loop drains locally queued control requests back to the
//! master. There is no implicit reconnect: once the link dies, a new
//! `PeerLink` must be built.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::sync::CancellationToken;

use super::connection::Connection;
use super::TransportStats;
use crate::error::{NetworkError, Result};
use crate::protocol::SyncMessage;
use crate::queue::MessageQueue;

/// One outbound connection to the master plus its send and receive loops.
pub struct PeerLink {
    conn: Arc<Connection>,
    requests: MessageQueue,
    updates: MessageQueue,
    stats: Arc<TransportStats>,
    cancel: CancellationToken,
}

impl PeerLink {
    /// Establish the connection to the master and start both loops. A
    /// connect failure is fatal and surfaces here.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| NetworkError::ConnectFailed(e.to_string()))?;
        let conn = Arc::new(Connection::new(stream)?);
        tracing::info!("Connected to master at {}", conn.peer_addr());

        let requests = MessageQueue::new();
        let updates = MessageQueue::new();
        let stats = Arc::new(TransportStats::default());
        let cancel = CancellationToken::new();

        tokio::spawn(Self::send_loop(
            Arc::clone(&conn),
            requests.clone(),
            Arc::clone(&stats),
            cancel.clone(),
        ));
        tokio::spawn(Self::receive_loop(
            Arc::clone(&conn),
            updates.clone(),
            Arc::clone(&stats),
            cancel.clone(),
        ));

        Ok(Self {
            conn,
            requests,
            updates,
            stats,
            cancel,
        })
    }

    /// Drain queued control requests to the master, FIFO, at-most-once.
    async fn send_loop(
        conn: Arc<Connection>,
        requests: MessageQueue,
        stats: Arc<TransportStats>,
        cancel: CancellationToken,
    ) {
        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                msg = requests.pop() => msg,
            };

            match conn.send(&msg).await {
                Ok(()) => stats.record_sent(1),
                Err(e) => {
                    // The request is dropped, not requeued
                    tracing::warn!("Link to master broken on send: {}", e);
                    conn.close().await;
                    break;
                }
            }
        }
        tracing::debug!("Slave send loop stopped");
    }

    /// Apply incoming state updates: a discard marker clears every pending
    /// update instead of being enqueued.
    async fn receive_loop(
        conn: Arc<Connection>,
        updates: MessageQueue,
        stats: Arc<TransportStats>,
        cancel: CancellationToken,
    ) {
        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                result = conn.receive() => match result {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::info!("Link to master closed: {}", e);
                        conn.close().await;
                        break;
                    }
                },
            };

            if msg.is_discard() {
                let dropped = updates.clear();
                tracing::debug!("Discard marker: dropped {} pending updates", dropped);
            } else {
                updates.push(msg);
                stats.record_received();
            }
        }
        tracing::debug!("Slave receive loop stopped");
    }

    /// Queue a control request for the master.
    pub fn enqueue_request(&self, msg: SyncMessage) {
        self.requests.push(msg);
    }

    /// Wait for the next state update from the master.
    pub async fn next_update(&self) -> SyncMessage {
        self.updates.pop().await
    }

    /// Take a pending state update without waiting.
    pub fn try_next_update(&self) -> Option<SyncMessage> {
        self.updates.try_pop()
    }

    /// Whether the underlying connection is still open.
    pub fn is_connected(&self) -> bool {
        !self.conn.is_closed()
    }

    /// The master's address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }

    /// Transport counters.
    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Stop both loops and close the socket.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.conn.close().await;
        tracing::info!("Peer link shut down");
    }
}
