use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use clap::Parser;
use exporter_app::{Cli, ExporterConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

const ENV_KEYS: [&str; 6] = [
    "TRUCKI_CONFIG",
    "TRUCKI_LISTEN_PORT",
    "TRUCKI_TARGET",
    "TRUCKI_POLL_INTERVAL_SECS",
    "TRUCKI_REQUEST_TIMEOUT_MS",
    "TRUCKI_METRICS_PATH",
];

#[test]
fn toml_config_validates() {
    let _guard = clean_env();
    env::set_var("TRUCKI_CONFIG", fixture_path("config-valid.toml"));

    let config = ExporterConfig::load().expect("load config");
    config.validate().expect("validate config");
    assert_eq!(config.listen_port, 9101);
    assert_eq!(config.target.as_deref(), Some("192.168.178.58"));
    assert_eq!(config.request_timeout_ms, 10_000);
    assert_eq!(config.poll_interval().expect("interval"), Duration::from_secs(15));
    assert!(!config.uses_default_interval());

    env::remove_var("TRUCKI_CONFIG");
}

#[test]
fn json_config_validates() {
    let _guard = clean_env();
    let path = fixture_path("config-valid.json");
    let cli = Cli::try_parse_from(["trucki-exporter", "--config", path.as_str()]).expect("parse cli");

    let config = ExporterConfig::load_with_cli(&cli).expect("load config");
    config.validate().expect("validate config");
    assert_eq!(config.listen_port, 9102);
    assert_eq!(config.target.as_deref(), Some("trucki.local"));
    assert_eq!(config.request_timeout_ms, 15_000);
    assert!(config.uses_default_interval());
}

#[test]
fn negative_interval_in_file_fails_validation() {
    let _guard = clean_env();
    env::set_var("TRUCKI_CONFIG", fixture_path("config-invalid.toml"));

    let config = ExporterConfig::load().expect("load config");
    assert!(config.validate().is_err());

    env::remove_var("TRUCKI_CONFIG");
}

#[test]
fn missing_target_fails_validation() {
    let _guard = clean_env();

    let config = ExporterConfig::load().expect("load config");
    assert_eq!(config.target, None);
    assert!(config.validate().is_err());

    let cli = Cli::try_parse_from(["trucki-exporter", "-t", "  "]).expect("parse cli");
    let config = ExporterConfig::load_with_cli(&cli).expect("load config");
    assert!(config.validate().is_err());
}

#[test]
fn cli_interval_is_validated() {
    let _guard = clean_env();

    for interval in ["0", "-3"] {
        let cli = Cli::try_parse_from(["trucki-exporter", "-t", "10.0.0.2", "-i", interval])
            .expect("parse cli");
        let config = ExporterConfig::load_with_cli(&cli).expect("load config");
        assert!(config.validate().is_err(), "interval {interval}");
        assert!(config.poll_interval().is_err());
    }

    let cli = Cli::try_parse_from(["trucki-exporter", "-t", "10.0.0.2", "-i", "5"]).expect("parse cli");
    let config = ExporterConfig::load_with_cli(&cli).expect("load config");
    config.validate().expect("validate config");
    assert!(config.uses_default_interval());
}

#[test]
fn defaults_apply_when_only_target_is_given() {
    let _guard = clean_env();
    let cli = Cli::try_parse_from(["trucki-exporter", "-t", "10.0.0.2"]).expect("parse cli");

    let config = ExporterConfig::load_with_cli(&cli).expect("load config");
    config.validate().expect("validate config");
    assert_eq!(config.listen_port, 8080);
    assert_eq!(config.metrics_path, "/metrics");
    assert_eq!(config.poll_interval().expect("interval"), Duration::from_secs(5));
    assert_eq!(config.client_config().target, "10.0.0.2");
    assert_eq!(config.client_config().timeout_ms, 15_000);
    assert_eq!(config.listen_addr().port(), 8080);
}

#[test]
fn cli_overrides_env_and_env_overrides_file() {
    let _guard = clean_env();
    env::set_var("TRUCKI_CONFIG", fixture_path("config-valid.toml"));
    env::set_var("TRUCKI_TARGET", "10.1.1.1");
    env::set_var("TRUCKI_POLL_INTERVAL_SECS", "30");

    let cli = Cli::try_parse_from(["trucki-exporter", "-p", "9200"]).expect("parse cli");
    let config = ExporterConfig::load_with_cli(&cli).expect("load config");
    assert_eq!(config.listen_port, 9200);
    assert_eq!(config.target.as_deref(), Some("10.1.1.1"));
    assert_eq!(config.poll_interval_secs, 30);

    let cli = Cli::try_parse_from(["trucki-exporter", "-t", "10.2.2.2", "-i", "7"]).expect("parse cli");
    let config = ExporterConfig::load_with_cli(&cli).expect("load config");
    assert_eq!(config.listen_port, 9101);
    assert_eq!(config.target.as_deref(), Some("10.2.2.2"));
    assert_eq!(config.poll_interval_secs, 7);

    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
fn invalid_ambient_settings_fail_validation() {
    let _guard = clean_env();
    let base = ExporterConfig {
        target: Some("10.0.0.2".to_string()),
        ..ExporterConfig::default()
    };
    base.validate().expect("base config");

    let config = ExporterConfig {
        listen_port: 0,
        ..base.clone()
    };
    assert!(config.validate().is_err());

    let config = ExporterConfig {
        request_timeout_ms: 0,
        ..base.clone()
    };
    assert!(config.validate().is_err());

    let config = ExporterConfig {
        metrics_path: "metrics".to_string(),
        ..base
    };
    assert!(config.validate().is_err());
}

#[test]
fn missing_config_file_is_an_error() {
    let _guard = clean_env();
    let cli = Cli::try_parse_from(["trucki-exporter", "--config", "/nonexistent/trucki.toml"])
        .expect("parse cli");
    assert!(ExporterConfig::load_with_cli(&cli).is_err());
}

fn clean_env() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for key in ENV_KEYS {
        env::remove_var(key);
    }
    guard
}

fn fixture_path(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path.to_string_lossy().to_string()
}
