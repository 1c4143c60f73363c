use std::env;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use trucki_client::ClientConfig;

use crate::cli::Cli;

pub const DEFAULT_LISTEN_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 5;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_METRICS_PATH: &str = "/metrics";

#[derive(Clone, Debug, PartialEq)]
pub struct ExporterConfig {
    pub listen_port: u16,
    pub target: Option<String>,
    /// Signed so that a negative value can be reported instead of rejected by
    /// the parser.
    pub poll_interval_secs: i64,
    pub request_timeout_ms: u64,
    pub metrics_path: String,
}

impl ExporterConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_cli(&Cli::default())
    }

    /// Defaults, then the config file, then `TRUCKI_*` variables, then flags.
    pub fn load_with_cli(cli: &Cli) -> Result<Self> {
        let mut config = Self::default();

        if let Some(file_config) = load_file_config(cli.config.as_deref())? {
            apply_file_config(&mut config, file_config);
        }

        apply_env_overrides(&mut config);
        apply_cli_overrides(&mut config, cli);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.target.as_deref() {
            Some(target) if !target.trim().is_empty() => {}
            _ => anyhow::bail!(
                "no Trucki stick address set, provide the IP address or hostname with -t"
            ),
        }
        self.poll_interval()?;
        if self.listen_port == 0 {
            anyhow::bail!("listen_port must be between 1 and 65535");
        }
        if self.request_timeout_ms == 0 {
            anyhow::bail!("device.request_timeout_ms must be >= 1");
        }
        if !self.metrics_path.starts_with('/') {
            anyhow::bail!("exporter.metrics_path must start with '/'");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        u64::try_from(self.poll_interval_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "invalid scrape interval {}, provide a number of seconds larger than zero",
                    self.poll_interval_secs
                )
            })
    }

    pub fn uses_default_interval(&self) -> bool {
        self.poll_interval_secs == DEFAULT_POLL_INTERVAL_SECS
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            target: self.target.clone().unwrap_or_default(),
            timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.listen_port))
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            target: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

fn apply_env_overrides(config: &mut ExporterConfig) {
    if let Some(port) = parse_env_u16("TRUCKI_LISTEN_PORT") {
        config.listen_port = port;
    }

    if let Ok(value) = env::var("TRUCKI_TARGET") {
        config.target = Some(value);
    }

    if let Some(interval) = parse_env_i64("TRUCKI_POLL_INTERVAL_SECS") {
        config.poll_interval_secs = interval;
    }

    if let Some(timeout_ms) = parse_env_u64("TRUCKI_REQUEST_TIMEOUT_MS") {
        config.request_timeout_ms = timeout_ms;
    }

    if let Ok(value) = env::var("TRUCKI_METRICS_PATH") {
        config.metrics_path = value;
    }
}

fn apply_cli_overrides(config: &mut ExporterConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.listen_port = port;
    }
    if let Some(ref target) = cli.target {
        config.target = Some(target.clone());
    }
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    exporter: Option<FileExporterConfig>,
    device: Option<FileDeviceConfig>,
    poller: Option<FilePollerConfig>,
}

#[derive(Debug, Deserialize)]
struct FileExporterConfig {
    listen_port: Option<u16>,
    metrics_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileDeviceConfig {
    target: Option<String>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FilePollerConfig {
    poll_interval_secs: Option<i64>,
}

fn load_file_config(config_path: Option<&str>) -> Result<Option<FileConfig>> {
    let path = match config_path {
        Some(path) => path.to_string(),
        None => match env::var("TRUCKI_CONFIG") {
            Ok(value) => value,
            Err(_) => return Ok(None),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("read config file {path}"))?;
    let ext = Path::new(&path).extension().and_then(|value| value.to_str());

    let config = match ext {
        Some("json") => serde_json::from_str(&content).context("parse json config")?,
        _ => toml::from_str(&content).context("parse toml config")?,
    };

    Ok(Some(config))
}

fn apply_file_config(config: &mut ExporterConfig, file: FileConfig) {
    if let Some(exporter) = file.exporter {
        if let Some(port) = exporter.listen_port {
            config.listen_port = port;
        }
        if let Some(path) = exporter.metrics_path {
            config.metrics_path = path;
        }
    }

    if let Some(device) = file.device {
        if let Some(target) = device.target {
            config.target = Some(target);
        }
        if let Some(timeout_ms) = device.request_timeout_ms {
            config.request_timeout_ms = timeout_ms;
        }
    }

    if let Some(poller) = file.poller {
        if let Some(interval) = poller.poll_interval_secs {
            config.poll_interval_secs = interval;
        }
    }
}

fn parse_env_u16(key: &str) -> Option<u16> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

fn parse_env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

fn parse_env_i64(key: &str) -> Option<i64> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}
