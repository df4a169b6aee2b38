//! Tests for the Weft configuration system.

use std::sync::Mutex;

use weft_core::config::WeftConfig;
use weft_core::errors::ConfigError;

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn clear_weft_env_vars() {
    for key in [
        "WEFT_CACHEABLE",
        "WEFT_LEASE_TIMEOUT_MS",
        "WEFT_MAX_FILE_SIZE",
        "WEFT_CACHE_DIR",
        "WEFT_PROXY_DIR",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_missing_project_file_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_weft_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let config = WeftConfig::load(dir.path()).unwrap();

    assert!(config.scan.roots.is_empty());
    assert_eq!(config.scan.include, vec!["**/*.src"]);
    assert!(!config.cache.cacheable);
    assert_eq!(config.cache.lease_timeout_ms, 30_000);
}

#[test]
fn test_env_overrides_project_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_weft_env_vars();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("weft.toml"),
        r#"
[scan]
roots = ["app/src"]
max_file_size = 1000000

[cache]
cacheable = false
"#,
    )
    .unwrap();

    std::env::set_var("WEFT_CACHEABLE", "true");
    std::env::set_var("WEFT_MAX_FILE_SIZE", "5000000");

    let config = WeftConfig::load(dir.path()).unwrap();
    assert!(config.cache.cacheable);
    assert_eq!(config.scan.max_file_size, 5_000_000);
    // Untouched project values survive.
    assert_eq!(config.scan.roots.len(), 1);

    clear_weft_env_vars();
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_weft_env_vars();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("weft.toml"), "[scan\nroots = ").unwrap();

    let err = WeftConfig::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_validation_rejects_zero_lease_timeout() {
    let err = WeftConfig::from_toml(
        r#"
[cache]
lease_timeout_ms = 0
"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ValidationFailed { ref field, .. } if field == "cache.lease_timeout_ms"
    ));
}

#[test]
fn test_poll_interval_must_not_exceed_timeout() {
    let err = WeftConfig::from_toml(
        r#"
[cache]
lease_timeout_ms = 100
lease_poll_ms = 500
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
}

#[test]
fn test_aspect_tables_parse_from_project_config() {
    let config = WeftConfig::from_toml(
        r#"
[[aspects]]
name = "App\\Aspect\\Logging"
classes = ["App\\Service\\*"]
annotations = ["Loggable*"]
priority = 10

[[aspects]]
name = "App\\Aspect\\Cache"
annotations = ["Cached"]
"#,
    )
    .unwrap();

    assert_eq!(config.aspects.len(), 2);
    assert_eq!(config.aspects[0].priority, Some(10));
    assert_eq!(config.aspects[1].priority, None);
    assert_eq!(config.aspects[1].annotations, vec!["Cached"]);
}
