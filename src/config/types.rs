use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Remote service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the giveaway service (scheme + host, no trailing slash).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

/// Session credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where the session token is persisted. Defaults to the config directory.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// Environment variable holding the host identity assertion.
    #[serde(default = "default_identity_env")]
    pub identity_env: String,
}

/// Reconciliation intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Profile/state re-fetch interval in milliseconds (default: 30000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Purchase status refresh interval in milliseconds (default: 30000).
    #[serde(default = "default_interval_ms")]
    pub purchase_interval_ms: u64,
}

pub const DEFAULT_BASE_URL: &str = "https://nail-miniapp.duckdns.org";
pub const DEFAULT_IDENTITY_ENV: &str = "GIVEAWAY_INIT_DATA";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_identity_env() -> String {
    DEFAULT_IDENTITY_ENV.to_string()
}

fn default_interval_ms() -> u64 {
    30_000
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds as u64)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds as u64)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn purchase_interval(&self) -> Duration {
        Duration::from_millis(self.purchase_interval_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: None,
            identity_env: default_identity_env(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            purchase_interval_ms: default_interval_ms(),
        }
    }
}
