//! Configuration parsing and defaults.

use quarry_core::config::AccessConfig;
use quarry_core::errors::AccessError;

#[test]
fn empty_config_uses_defaults() {
    let config = AccessConfig::from_toml_str("").unwrap();
    assert_eq!(config.db_path, None);
    assert_eq!(config.effective_busy_timeout_ms(), 5_000);
    assert_eq!(config.effective_page_size(), 100);
    assert_eq!(config.cache_capacity, None);
    assert_eq!(config.max_concurrent_fetches, None);
}

#[test]
fn full_config_round_trips() {
    let text = r#"
db_path = "/var/lib/app/data.db"
busy_timeout_ms = 1000
page_size = 50
cache_capacity = 10000
max_concurrent_fetches = 8
"#;
    let config = AccessConfig::from_toml_str(text).unwrap();
    assert_eq!(config.db_path.as_deref(), Some("/var/lib/app/data.db"));
    assert_eq!(config.effective_busy_timeout_ms(), 1_000);
    assert_eq!(config.effective_page_size(), 50);
    assert_eq!(config.cache_capacity, Some(10_000));
    assert_eq!(config.max_concurrent_fetches, Some(8));
}

#[test]
fn malformed_toml_is_an_invalid_argument() {
    let err = AccessConfig::from_toml_str("page_size = \"lots\"").unwrap_err();
    assert!(matches!(err, AccessError::InvalidArgument { .. }));
}
