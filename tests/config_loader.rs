mod common;

use giveaway_sync::config::{Config, ConfigError, DEFAULT_BASE_URL, ENV_API_BASE};
use std::time::Duration;
use tempfile::TempDir;

/// Test that Config::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.api.connect_timeout(), Duration::from_secs(5));
    assert_eq!(config.session.identity_env, "GIVEAWAY_INIT_DATA");
    assert!(config.session.token_file.is_none());
    assert_eq!(config.polling.interval(), Duration::from_secs(30));
    assert_eq!(config.polling.purchase_interval(), Duration::from_secs(30));
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("giveaway-sync/config.toml"));
}

#[test]
fn test_missing_file_gives_defaults() {
    let _env = common::env_lock();
    std::env::remove_var(ENV_API_BASE);
    let dir = TempDir::new().unwrap();

    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
}

#[test]
fn test_load_partial_file() {
    let _env = common::env_lock();
    std::env::remove_var(ENV_API_BASE);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "https://staging.example.org/"

[session]
token_file = "/tmp/giveaway-session.json"

[polling]
interval_ms = 5000
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.api.base_url, "https://staging.example.org");
    assert_eq!(config.api.timeout_seconds, 30);
    assert_eq!(
        config.token_path(),
        std::path::PathBuf::from("/tmp/giveaway-session.json")
    );
    assert_eq!(config.polling.interval(), Duration::from_secs(5));
    assert_eq!(config.polling.purchase_interval(), Duration::from_secs(30));
}

#[test]
fn test_env_overrides_base_url() {
    let _env = common::env_lock();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[api]\nbase_url = \"https://file.example.org\"\n").unwrap();

    std::env::set_var(ENV_API_BASE, "http://127.0.0.1:8080/");
    let result = Config::load_from(&path);
    std::env::remove_var(ENV_API_BASE);

    assert_eq!(result.unwrap().api.base_url, "http://127.0.0.1:8080");
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let _env = common::env_lock();
    std::env::remove_var(ENV_API_BASE);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[api\nbase_url = ").unwrap();

    let err = Config::load_from(&path).unwrap_err();

    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_validation_rejects_bad_values() {
    let _env = common::env_lock();
    std::env::remove_var(ENV_API_BASE);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    std::fs::write(&path, "[api]\nbase_url = \"ftp://example.org\"\n").unwrap();
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ValidationError { .. })
    ));

    std::fs::write(&path, "[api]\ntimeout_seconds = 0\n").unwrap();
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ValidationError { .. })
    ));
}
