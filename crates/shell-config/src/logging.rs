//! Logging initialization for the shell.
//!
//! Every shell process calls [`init_logging`] once at startup and uses
//! standard `tracing` macros afterwards. Output is structured JSON on stderr
//! so multiple processes can interleave lines safely.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system.
///
/// The level comes from the `RUST_LOG` env var when set, otherwise from the
/// provided default. Calling this twice is a no-op.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let _ = fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_current_span(false)
        .try_init();
}
