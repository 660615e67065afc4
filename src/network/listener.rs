//! Master-side accept loop
//!
//! Accepts peer connections indefinitely and registers each one. Runs on
//! its own task so accepting never blocks behind in-flight sends or
//! receives. A failure to bind is the one fatal setup error; a failed
//! accept of a single peer is logged and skipped.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;

use super::collector::Collector;
use super::connection::Connection;
use super::registry::ConnectionRegistry;
use crate::error::NetworkError;

/// Accepts inbound peer connections for the master endpoint.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind the accept socket. Surfacing this error to the caller before
    /// any loop starts is the only fatal path in the transport.
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, NetworkError> {
        let inner = TcpListener::bind(addr)
            .await
            .map_err(|e| NetworkError::BindFailed(e.to_string()))?;
        Ok(Self { inner })
    }

    /// The bound local address, useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept until cancelled. Every accepted socket is registered and
    /// handed to the collector for reading.
    pub async fn run(
        self,
        registry: Arc<ConnectionRegistry>,
        collector: Collector,
        cancel: CancellationToken,
    ) {
        loop {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.inner.accept() => accepted,
            };

            let stream = match accepted {
                Ok((stream, _)) => stream,
                Err(e) => {
                    tracing::warn!("Failed to accept peer: {}", e);
                    continue;
                }
            };

            match Connection::new(stream) {
                Ok(conn) => {
                    let conn = Arc::new(conn);
                    tracing::info!("Accepted connection from {}", conn.peer_addr());
                    registry.add(Arc::clone(&conn));
                    collector.attach(conn);
                }
                Err(e) => {
                    tracing::warn!("Failed to accept peer: {}", e);
                }
            }
        }
        tracing::debug!("Listener stopped");
    }
}
