//! Configuration management for the shell.

use crate::{ConfigError, ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default credential exchange base URL (can be overridden at compile time
/// via the TWEAKBENCH_EXCHANGE_URL env var).
pub const DEFAULT_EXCHANGE_URL: &str = match option_env!("TWEAKBENCH_EXCHANGE_URL") {
    Some(url) => url,
    None => "https://api.tweakbench.app",
};

/// Custom URI scheme registered for deep-link activation.
pub const DEFAULT_DEEP_LINK_SCHEME: &str = "tweakbench";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default timeout for a pending "open external auth window" request.
pub const DEFAULT_OPEN_WINDOW_TIMEOUT_SECS: u64 = 300;

/// Main shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Credential exchange base URL.
    #[serde(default = "default_exchange_url")]
    pub exchange_url: String,
    /// Custom URI scheme for deep-link activation.
    #[serde(default = "default_deep_link_scheme")]
    pub deep_link_scheme: String,
    /// URL prefix that marks an auth redirect as complete when an embedded
    /// window navigates to it.
    #[serde(default = "default_success_url_prefix")]
    pub success_url_prefix: String,
    /// Seconds before a pending open-window request resolves as timed out.
    #[serde(default = "default_open_window_timeout_secs")]
    pub open_window_timeout_secs: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_exchange_url() -> String {
    DEFAULT_EXCHANGE_URL.to_string()
}

fn default_deep_link_scheme() -> String {
    DEFAULT_DEEP_LINK_SCHEME.to_string()
}

fn default_success_url_prefix() -> String {
    format!("{}/auth/success", DEFAULT_EXCHANGE_URL)
}

fn default_open_window_timeout_secs() -> u64 {
    DEFAULT_OPEN_WINDOW_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            exchange_url: default_exchange_url(),
            deep_link_scheme: default_deep_link_scheme(),
            success_url_prefix: default_success_url_prefix(),
            open_window_timeout_secs: default_open_window_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let config_path = paths.config_file();

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Persist configuration to the config file.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_base_dir()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> ConfigResult<()> {
        Url::parse(&self.exchange_url)
            .map_err(|e| ConfigError::Invalid(format!("exchange_url: {}", e)))?;
        Url::parse(&self.success_url_prefix)
            .map_err(|e| ConfigError::Invalid(format!("success_url_prefix: {}", e)))?;

        if self.deep_link_scheme.is_empty()
            || !self
                .deep_link_scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '+')
        {
            return Err(ConfigError::Invalid(format!(
                "deep_link_scheme is not a valid URI scheme: {:?}",
                self.deep_link_scheme
            )));
        }

        if self.open_window_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "open_window_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.deep_link_scheme, "tweakbench");
        assert!(config.success_url_prefix.starts_with(&config.exchange_url));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_base_dir(temp.path().to_path_buf());
        let config = Config::load(&paths).unwrap();
        assert_eq!(config.exchange_url, DEFAULT_EXCHANGE_URL);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_base_dir(temp.path().to_path_buf());

        let mut config = Config::default();
        config.log_level = "debug".to_string();
        config.open_window_timeout_secs = 60;
        config.save(&paths).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.open_window_timeout_secs, 60);
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_base_dir(temp.path().to_path_buf());
        std::fs::create_dir_all(paths.base_dir()).unwrap();
        std::fs::write(paths.config_file(), r#"{"log_level":"trace"}"#).unwrap();

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.deep_link_scheme, DEFAULT_DEEP_LINK_SCHEME);
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let config = Config {
            deep_link_scheme: "not a scheme".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config {
            open_window_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
