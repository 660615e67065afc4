//! Length-prefixed framing over a byte stream
//!
//! `encode_frame` never fails. `read_frame` returns `ConnectionClosed` on
//! any short read, whether inside the length prefix or the payload; a
//! partial payload is never surfaced. No maximum frame size is enforced
//! here, so callers must bound what they feed the encoder.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::constants::LENGTH_PREFIX_BYTES;
use crate::error::NetworkError;

/// Prepend the 4-byte big-endian length prefix to a payload.
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_BYTES + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Read one complete frame, returning its payload.
pub async fn read_frame<R>(reader: &mut R) -> Result<Bytes, NetworkError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; LENGTH_PREFIX_BYTES];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|_| NetworkError::ConnectionClosed)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|_| NetworkError::ConnectionClosed)?;

    Ok(Bytes::from(payload))
}
