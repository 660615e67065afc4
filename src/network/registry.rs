//! The live set of peer connections
//!
//! The registry is written by the listener (accepts) and by the broadcaster
//! and collector (failure removal), all from different tasks. Iteration
//! always goes through `snapshot`, never the live map, so a broadcast round
//! can never race with a concurrent add or remove.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::connection::Connection;

/// Concurrent set of currently-connected peers.
///
/// A connection present here is assumed live; absence means it will receive
/// no further messages.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, Arc<Connection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    pub fn add(&self, conn: Arc<Connection>) {
        self.connections.insert(conn.id(), conn);
    }

    /// Deregister a connection. No-op if it was already removed.
    pub fn remove(&self, id: Uuid) -> Option<Arc<Connection>> {
        self.connections.remove(&id).map(|(_, conn)| conn)
    }

    /// A stable copy of the current connections, safe to iterate while the
    /// registry is concurrently mutated.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no peers are connected.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    async fn dummy_connection() -> Arc<Connection> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, server) = tokio::join!(TcpStream::connect(addr), listener.accept());
        // Keep the server half alive only long enough to build the client side
        drop(server.unwrap());
        Arc::new(Connection::new(client.unwrap()).unwrap())
    }

    #[tokio::test]
    async fn test_add_remove() {
        let registry = ConnectionRegistry::new();
        let conn = dummy_connection().await;
        let id = conn.id();

        registry.add(conn);
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(id).is_some());
        assert!(registry.is_empty());

        // Removing again is a no-op
        assert!(registry.remove(id).is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_stable() {
        let registry = ConnectionRegistry::new();
        let a = dummy_connection().await;
        let b = dummy_connection().await;
        registry.add(Arc::clone(&a));
        registry.add(Arc::clone(&b));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);

        // Mutating the registry does not disturb the copy
        registry.remove(a.id());
        registry.remove(b.id());
        assert_eq!(snapshot.len(), 2);
        assert!(registry.is_empty());
    }
}
