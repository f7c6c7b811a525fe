//! File system paths for the shell.

use crate::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Bridge socket filename under the base runtime directory.
const BRIDGE_SOCKET_NAME: &str = "bridge.sock";
/// Instance socket filename under the base runtime directory.
const INSTANCE_SOCKET_NAME: &str = "instance.sock";
/// PID filename under the base runtime directory.
const PID_FILE_NAME: &str = "shell.pid";
/// Session store filename under the base runtime directory.
const SESSION_STORE_NAME: &str = "session.json";

/// Manages file system paths for the shell.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.tweakbench)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.tweakbench`.
    pub fn new() -> ConfigResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".tweakbench"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.tweakbench).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.tweakbench/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the UI bridge socket path (~/.tweakbench/bridge.sock).
    pub fn bridge_socket(&self) -> PathBuf {
        self.base_dir.join(BRIDGE_SOCKET_NAME)
    }

    /// Get the single-instance socket path (~/.tweakbench/instance.sock).
    pub fn instance_socket(&self) -> PathBuf {
        self.base_dir.join(INSTANCE_SOCKET_NAME)
    }

    /// Get the PID file path (~/.tweakbench/shell.pid).
    pub fn pid_file(&self) -> PathBuf {
        self.base_dir.join(PID_FILE_NAME)
    }

    /// Get the session store path (~/.tweakbench/session.json).
    pub fn session_store(&self) -> PathBuf {
        self.base_dir.join(SESSION_STORE_NAME)
    }

    /// Ensure the base directory exists.
    pub fn ensure_base_dir(&self) -> ConfigResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}
