//! Client configuration: service endpoint, session persistence, polling cadence.

mod loader;
mod types;

pub use loader::{ConfigError, ENV_API_BASE};
pub use types::{
    ApiConfig, Config, PollingConfig, SessionConfig, DEFAULT_BASE_URL, DEFAULT_IDENTITY_ENV,
};
