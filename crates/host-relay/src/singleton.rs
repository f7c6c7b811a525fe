//! Single-instance enforcement.
//!
//! The first shell process binds the instance socket and writes a PID file.
//! Later launches probe the socket: a live listener means an instance is
//! already running and the new process forwards its activation argument and
//! exits. A socket file nobody answers on is left over from a crash and is
//! removed.

use crate::error::{RelayError, RelayResult};
use bridge_ipc::{BridgeClient, Method};
use std::fs;
use std::os::unix::net::UnixStream;
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of probing for an existing instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonCheck {
    /// No other instance; this process may bind the socket.
    Available,
    /// A stale socket file was removed; this process may bind.
    StaleSocketCleaned,
    /// Another instance answered the probe.
    AlreadyRunning,
}

/// Probe the instance socket for a live listener.
pub fn check_singleton(socket_path: &Path) -> SingletonCheck {
    if !socket_path.exists() {
        return SingletonCheck::Available;
    }

    match UnixStream::connect(socket_path) {
        Ok(_) => SingletonCheck::AlreadyRunning,
        Err(error) => {
            debug!(%error, "Instance socket exists but nobody answered, removing");
            if let Err(error) = fs::remove_file(socket_path) {
                warn!(%error, "Failed to remove stale instance socket");
            }
            SingletonCheck::StaleSocketCleaned
        }
    }
}

/// Forward an activation argument to the running instance.
pub async fn forward_activation(socket_path: &Path, raw_url: &str) -> RelayResult<()> {
    let client = BridgeClient::new(socket_path);
    let response = client
        .call_method_with_params(
            Method::ActivationDeepLink,
            serde_json::json!({ "url": raw_url }),
        )
        .await?;

    if let Some(error) = response.error {
        return Err(RelayError::ForwardRejected(error.message));
    }

    info!("Forwarded activation to the running instance");
    Ok(())
}

/// Write the current process ID to the PID file.
pub fn write_pid_file(path: &Path) -> RelayResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, std::process::id().to_string())?;
    Ok(())
}

/// Read the PID recorded in the PID file.
pub fn read_pid_file(path: &Path) -> RelayResult<u32> {
    let contents = fs::read_to_string(path)?;
    contents
        .trim()
        .parse()
        .map_err(|_| RelayError::PidFile(format!("Invalid PID file contents: {}", contents.trim())))
}

/// Remove the PID file, ignoring a file that is already gone.
pub fn cleanup_pid_file(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        if error.kind() != std::io::ErrorKind::NotFound {
            warn!(%error, "Failed to remove PID file");
        }
    }
}
