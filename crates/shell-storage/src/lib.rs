//! Client-local persistent storage for the TweakBench shell.
//!
//! The UI process is the sole owner of durable session state: one opaque
//! bearer token under a single well-known key, plus the mirrored user
//! record. Storage backends implement [`TokenStorage`]; the default backend
//! is a JSON file in the shell's base directory.

mod file;
mod keys;
mod session_store;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use session_store::SessionStore;
pub use traits::TokenStorage;

use std::path::Path;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Encoding(error.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a session store backed by the default file storage at `path`.
pub fn create_session_store(path: &Path) -> StorageResult<SessionStore> {
    let storage = FileStorage::new(path)?;
    Ok(SessionStore::new(Box::new(storage)))
}
