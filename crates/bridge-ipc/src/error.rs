//! Bridge error types.

use thiserror::Error;

/// Error type for bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Socket-level failure
    #[error("Socket error: {0}")]
    Socket(String),

    /// Peer closed the connection
    #[error("Connection closed")]
    ConnectionClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;
