//! Frame codec for the sync wire format
//!
//! Every message travels as one frame: a 4-byte big-endian unsigned length
//! followed by exactly that many payload bytes.

pub mod framing;

pub use framing::{encode_frame, read_frame};
