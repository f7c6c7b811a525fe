//! Flow error types.

use thiserror::Error;

/// Error type for session-flow operations.
#[derive(Error, Debug)]
pub enum FlowError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Persistent storage error
    #[error("Storage error: {0}")]
    Storage(#[from] shell_storage::StorageError),

    /// Credential exchange endpoint rejected or garbled the request
    #[error("Credential exchange error: {0}")]
    Exchange(String),
}

/// Result type alias using FlowError.
pub type FlowResult<T> = Result<T, FlowError>;
