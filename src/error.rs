//! Error types for the playback sync transport

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket bind failed: {0}")]
    BindFailed(String),

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The peer closed its end of the stream, the stream errored
    /// mid-frame, or the payload was not valid UTF-8. All collapse to
    /// this variant: the connection is dead.
    #[error("Connection closed by peer")]
    ConnectionClosed,
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
