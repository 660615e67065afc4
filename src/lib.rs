//! # LAN Player Sync
//!
//! Low-latency master/slave media playback synchronization over LAN.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          MASTER ENDPOINT                          │
//! │  ┌─────────────────┐                         ┌─────────────────┐  │
//! │  │ Playback Engine │── position/commands ───▶│  OutboundQueue  │  │
//! │  │   (external)    │◀─── peer requests ──────│  InboundQueue   │  │
//! │  └─────────────────┘                         └────────┬────────┘  │
//! │                                                       │           │
//! │  ┌──────────┐      ┌─────────────────────────┐        ▼           │
//! │  │ Listener │─────▶│   ConnectionRegistry    │◀── Broadcaster     │
//! │  │ (accept) │      │ (snapshot per round)    │◀── Collector       │
//! │  └──────────┘      └────┬────────┬────────┬──┘   (task per peer)  │
//! └─────────────────────────┼────────┼────────┼──────────────────────┘
//!                           │        │        │    TCP, framed:
//!                           ▼        ▼        ▼    [len u32 BE][UTF-8]
//!                   ┌──────────┐ ┌──────────┐ ┌──────────┐
//!                   │  SLAVE   │ │  SLAVE   │ │  SLAVE   │
//!                   │ PeerLink │ │ PeerLink │ │ PeerLink │
//!                   └──────────┘ └──────────┘ └──────────┘
//!          recv loop ──▶ InboundQueue ──▶ engine (apply state)
//!          engine ──▶ OutboundQueue ──▶ send loop (control requests)
//! ```
//!
//! The transport is best-effort and at-most-once: a peer whose socket fails
//! is dropped from the registry and receives nothing further. Message
//! ordering is FIFO per connection; no ordering is guaranteed across peers.

pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod queue;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default host for binding (master) and connecting (slave)
    pub const DEFAULT_HOST: &str = "localhost";

    /// Default TCP port for the sync channel
    pub const DEFAULT_PORT: u16 = 9999;

    /// Maximum concurrent sends within one broadcast round
    pub const FANOUT_WORKERS: usize = 5;

    /// Size of the big-endian length prefix on every frame
    pub const LENGTH_PREFIX_BYTES: usize = 4;
}
