use imbalance_ingestor::config::{BASE_URL_ENV, ConfigError, IngestorConfig};
use serial_test::serial;

fn set(value: &str) {
    // SAFETY: every test touching the environment is #[serial].
    unsafe { std::env::set_var(BASE_URL_ENV, value) };
}

fn clear() {
    // SAFETY: every test touching the environment is #[serial].
    unsafe { std::env::remove_var(BASE_URL_ENV) };
}

#[test]
#[serial]
fn base_url_override_replaces_the_configured_one() {
    set("http://127.0.0.1:9000/");
    let config = IngestorConfig::default().with_env_overrides();
    clear();

    let config = config.unwrap();
    assert_eq!(config.base(), "http://127.0.0.1:9000");
}

#[test]
#[serial]
fn blank_override_is_ignored() {
    set("   ");
    let config = IngestorConfig::default().with_env_overrides();
    clear();

    assert_eq!(config.unwrap().base_url, IngestorConfig::default().base_url);
}

#[test]
#[serial]
fn unset_override_keeps_file_values() {
    clear();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("imbalance.toml");
    std::fs::write(&path, "base_url = \"https://mirror.example\"\ncache_ttl_secs = 60\n").unwrap();

    let config = IngestorConfig::from_path(&path)
        .and_then(IngestorConfig::with_env_overrides)
        .unwrap();

    assert_eq!(config.base_url, "https://mirror.example");
    assert_eq!(config.cache_ttl(), chrono::Duration::seconds(60));
}

#[test]
#[serial]
fn invalid_file_is_reported_with_its_cause() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("imbalance.toml");
    std::fs::write(&path, "[locator]\nlookback_days = \"five\"\n").unwrap();

    assert!(matches!(
        IngestorConfig::from_path(&path),
        Err(ConfigError::Parse(_))
    ));
}
