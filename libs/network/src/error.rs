//! Transport error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by peer transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Establishing a connection failed.
    #[error("connection to {peer} failed: {message}")]
    Connection { peer: String, message: String },

    /// Writing to an established connection failed.
    #[error("send to {peer} failed: {message}")]
    Send { peer: String, message: String },

    /// The handle does not (or no longer does) refer to a live connection.
    #[error("unknown peer handle for {peer}")]
    UnknownHandle { peer: String },

    /// Connection attempt exceeded its bound.
    #[error("timed out connecting to {peer} after {timeout_ms}ms")]
    ConnectTimeout { peer: String, timeout_ms: u64 },

    /// Frame encoding failed.
    #[error("failed to encode wire frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TransportError {
    pub fn connection(peer: impl ToString, message: impl Into<String>) -> Self {
        TransportError::Connection {
            peer: peer.to_string(),
            message: message.into(),
        }
    }

    pub fn send(peer: impl ToString, message: impl Into<String>) -> Self {
        TransportError::Send {
            peer: peer.to_string(),
            message: message.into(),
        }
    }
}
