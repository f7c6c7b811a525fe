//! Runtime configuration for the TweakBench shell.
//!
//! This crate provides:
//! - File system paths for runtime files (sockets, PID file, config)
//! - JSON configuration with compile-time defaults
//! - Logging initialization shared by every shell process

mod config;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_DEEP_LINK_SCHEME, DEFAULT_EXCHANGE_URL, DEFAULT_LOG_LEVEL,
    DEFAULT_OPEN_WINDOW_TIMEOUT_SECS,
};
pub use logging::init_logging;
pub use paths::Paths;

use thiserror::Error;

/// Error type for configuration and path resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Path could not be resolved
    #[error("Path error: {0}")]
    Path(String),

    /// Configuration value is invalid
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
