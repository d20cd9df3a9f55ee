use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_BASE: &str = "GIVEAWAY_API_BASE";

const APP_DIR: &str = "giveaway-sync";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Directory holding the config file and the persisted session token.
    ///
    /// Uses `~/.config/giveaway-sync` on Unix/macOS, or the equivalent via
    /// `dirs::config_dir()`. Falls back to the current directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Returns the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path.
    ///
    /// - If the file doesn't exist, starts from `Config::default()`.
    /// - Applies the `GIVEAWAY_API_BASE` override, then validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
            toml::from_str::<Config>(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            Config::default()
        };

        if let Some(base) = env_non_empty(ENV_API_BASE) {
            config.api.base_url = base;
        }
        config.api.base_url = config.api.base_url.trim().trim_end_matches('/').to_string();

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The base URL uses http(s) and has a host
    /// - Timeouts and polling intervals are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.api.base_url;
        let usable = Url::parse(base).is_ok_and(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        });
        if !usable {
            return Err(ConfigError::ValidationError {
                message: format!("api.base_url '{}' must be an http(s) URL with a host", base),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "api.timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.polling.interval_ms == 0 || self.polling.purchase_interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "polling intervals must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Resolved location of the persisted session token.
    pub fn token_path(&self) -> PathBuf {
        self.session
            .token_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("session.json"))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
