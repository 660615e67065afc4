//! One live socket to a peer
//!
//! A `Connection` is created on accept (master) or connect (slave) and is
//! destroyed on the first send/receive failure or an explicit close. Closed
//! is terminal; reconnecting means building a new `Connection`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::codec::{encode_frame, read_frame};
use crate::error::NetworkError;
use crate::protocol::SyncMessage;

/// A single bidirectional peer connection.
///
/// Send and receive run concurrently: the stream halves sit behind separate
/// async mutexes, so the reader task never contends with the broadcaster.
pub struct Connection {
    id: Uuid,
    peer_addr: SocketAddr,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    closed: AtomicBool,
}

impl Connection {
    /// Wrap an established TCP stream.
    pub fn new(stream: TcpStream) -> Result<Self, NetworkError> {
        let peer_addr = stream
            .peer_addr()
            .map_err(|e| NetworkError::ConnectFailed(e.to_string()))?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            id: Uuid::new_v4(),
            peer_addr,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
        })
    }

    /// Unique identity of this connection.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Remote peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Whether this connection has transitioned to the terminal closed state.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Encode and write one message. A write error moves the connection to
    /// closed and surfaces as `SendFailed`; the message is not retried.
    pub async fn send(&self, msg: &SyncMessage) -> Result<(), NetworkError> {
        if self.is_closed() {
            return Err(NetworkError::SendFailed("connection is closed".into()));
        }

        let frame = encode_frame(msg.encode().as_bytes());
        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await.map_err(|e| {
            self.closed.store(true, Ordering::Release);
            NetworkError::SendFailed(e.to_string())
        })
    }

    /// Read and decode one message. Any stream error, short frame, or
    /// non-UTF-8 payload moves the connection to closed and surfaces as
    /// `ConnectionClosed`.
    pub async fn receive(&self) -> Result<SyncMessage, NetworkError> {
        if self.is_closed() {
            return Err(NetworkError::ConnectionClosed);
        }

        let mut reader = self.reader.lock().await;
        let payload = read_frame(&mut *reader).await.map_err(|e| {
            self.closed.store(true, Ordering::Release);
            e
        })?;
        drop(reader);

        match std::str::from_utf8(&payload) {
            Ok(text) => Ok(SyncMessage::parse(text)),
            Err(_) => {
                self.closed.store(true, Ordering::Release);
                Err(NetworkError::ConnectionClosed)
            }
        }
    }

    /// Shut the socket down. Safe to call more than once; only the first
    /// call touches the stream.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (Connection, Connection) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr);
        let server = listener.accept();
        let (client, server) = tokio::join!(client, server);

        (
            Connection::new(client.unwrap()).unwrap(),
            Connection::new(server.unwrap().0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_send_receive() {
        let (a, b) = connected_pair().await;

        a.send(&SyncMessage::Position(4500)).await.unwrap();
        a.send(&SyncMessage::Play).await.unwrap();

        assert_eq!(b.receive().await.unwrap(), SyncMessage::Position(4500));
        assert_eq!(b.receive().await.unwrap(), SyncMessage::Play);
    }

    #[tokio::test]
    async fn test_receive_after_peer_close() {
        let (a, b) = connected_pair().await;

        a.close().await;
        let result = b.receive().await;
        assert!(matches!(result, Err(NetworkError::ConnectionClosed)));
        assert!(b.is_closed());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (a, _b) = connected_pair().await;
        a.close().await;
        a.close().await;
        assert!(a.is_closed());
    }

    #[tokio::test]
    async fn test_send_on_closed_connection() {
        let (a, _b) = connected_pair().await;
        a.close().await;
        let result = a.send(&SyncMessage::Play).await;
        assert!(matches!(result, Err(NetworkError::SendFailed(_))));
    }
}
