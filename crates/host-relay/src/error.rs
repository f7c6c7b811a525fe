//! Relay error types.

use thiserror::Error;

/// Error type for relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Bridge communication error
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_ipc::BridgeError),

    /// Activation forwarding was rejected by the running instance
    #[error("Activation forward rejected: {0}")]
    ForwardRejected(String),

    /// PID file error
    #[error("PID file error: {0}")]
    PidFile(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using RelayError.
pub type RelayResult<T> = Result<T, RelayError>;
