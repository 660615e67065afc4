//! Sync protocol messages
//!
//! The wire carries short UTF-8 text payloads; the message kind is inferred
//! from the payload content, never from an explicit tag. The classification
//! rules here are fixed by the deployed protocol and must not grow new
//! content-sniffed kinds:
//!
//! | payload             | meaning                          |
//! |---------------------|----------------------------------|
//! | contains `d`        | discard pending position updates |
//! | `<` / `>`           | halve / double playback rate     |
//! | `P` / `p` / `S`     | play / pause / stop              |
//! | decimal integer     | playback position in ms          |
//! | anything else       | passed through to the engine     |
//!
//! The `d` rule is checked before every other rule, so a payload like
//! `seek-d` is a discard marker even though it is not the literal `d`.

use std::fmt;

/// One playback synchronization message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Master's current playback position in milliseconds
    Position(u64),
    /// Halve the playback rate (`<`)
    HalveRate,
    /// Double the playback rate (`>`)
    DoubleRate,
    /// Resume playback (`P`)
    Play,
    /// Pause playback (`p`)
    Pause,
    /// Stop playback (`S`)
    Stop,
    /// Drop all queued, not-yet-applied position updates. Carries the
    /// original payload so re-encoding is byte-exact.
    Discard(String),
    /// Unrecognized payload, passed through untouched. This layer does not
    /// validate application content; the engine must be defensive.
    Other(String),
}

impl SyncMessage {
    /// Classify a decoded payload.
    pub fn parse(payload: &str) -> Self {
        // Discard sniffing comes first; this mirrors the deployed receiver,
        // which tests for `d` before anything else.
        if payload.contains('d') {
            return SyncMessage::Discard(payload.to_owned());
        }

        match payload {
            "<" => return SyncMessage::HalveRate,
            ">" => return SyncMessage::DoubleRate,
            "P" => return SyncMessage::Play,
            "p" => return SyncMessage::Pause,
            "S" => return SyncMessage::Stop,
            _ => {}
        }

        match payload.parse::<u64>() {
            Ok(ms) => SyncMessage::Position(ms),
            Err(_) => SyncMessage::Other(payload.to_owned()),
        }
    }

    /// Wire payload for this message.
    pub fn encode(&self) -> String {
        match self {
            SyncMessage::Position(ms) => ms.to_string(),
            SyncMessage::HalveRate => "<".to_owned(),
            SyncMessage::DoubleRate => ">".to_owned(),
            SyncMessage::Play => "P".to_owned(),
            SyncMessage::Pause => "p".to_owned(),
            SyncMessage::Stop => "S".to_owned(),
            SyncMessage::Discard(raw) => raw.clone(),
            SyncMessage::Other(raw) => raw.clone(),
        }
    }

    /// Whether this message instructs the receiver to clear its pending
    /// queue instead of being enqueued.
    pub fn is_discard(&self) -> bool {
        matches!(self, SyncMessage::Discard(_))
    }

    /// Convenience constructor for a discard marker with the canonical
    /// single-letter payload.
    pub fn discard() -> Self {
        SyncMessage::Discard("d".to_owned())
    }
}

impl fmt::Display for SyncMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMessage::Position(ms) => write!(f, "position {}ms", ms),
            SyncMessage::HalveRate => write!(f, "halve rate"),
            SyncMessage::DoubleRate => write!(f, "double rate"),
            SyncMessage::Play => write!(f, "play"),
            SyncMessage::Pause => write!(f, "pause"),
            SyncMessage::Stop => write!(f, "stop"),
            SyncMessage::Discard(_) => write!(f, "discard pending positions"),
            SyncMessage::Other(raw) => write!(f, "unrecognized {:?}", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_classification() {
        assert_eq!(SyncMessage::parse("<"), SyncMessage::HalveRate);
        assert_eq!(SyncMessage::parse(">"), SyncMessage::DoubleRate);
        assert_eq!(SyncMessage::parse("P"), SyncMessage::Play);
        assert_eq!(SyncMessage::parse("p"), SyncMessage::Pause);
        assert_eq!(SyncMessage::parse("S"), SyncMessage::Stop);
    }

    #[test]
    fn test_position_classification() {
        assert_eq!(SyncMessage::parse("0"), SyncMessage::Position(0));
        assert_eq!(SyncMessage::parse("91742"), SyncMessage::Position(91742));
    }

    #[test]
    fn test_discard_wins_over_everything() {
        assert!(SyncMessage::parse("d").is_discard());
        assert!(SyncMessage::parse("seek-d").is_discard());
        assert!(SyncMessage::parse("123d456").is_discard());
    }

    #[test]
    fn test_unknown_passthrough() {
        let msg = SyncMessage::parse("hello");
        assert_eq!(msg, SyncMessage::Other("hello".to_owned()));
        assert_eq!(msg.encode(), "hello");
    }

    #[test]
    fn test_encode_roundtrip() {
        for msg in [
            SyncMessage::Position(1234),
            SyncMessage::HalveRate,
            SyncMessage::DoubleRate,
            SyncMessage::Play,
            SyncMessage::Pause,
            SyncMessage::Stop,
            SyncMessage::discard(),
        ] {
            assert_eq!(SyncMessage::parse(&msg.encode()), msg);
        }
    }
}
