use std::time::Duration;

use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::debug;

const LIVE_PATH: &str = "jsonlive";

/// Connection settings for a single Trucki stick.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hostname or IP address, optionally with `:port`. A leading `http://`
    /// is tolerated.
    pub target: String,
    /// Upper bound for the whole request, body included.
    pub timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid device address {0}")]
    InvalidTarget(String),
    #[error("http client setup failed: {0}")]
    Setup(#[source] reqwest::Error),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("device returned non 200 status {status}")]
    UpstreamStatus { status: u16 },
    #[error("failed to read response body: {0}")]
    Read(#[source] reqwest::Error),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Network(err) | Self::Read(err) => err.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TruckiClient {
    http: reqwest::Client,
    url: Url,
}

impl TruckiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let target = config.target.trim();
        let target = target
            .strip_prefix("http://")
            .unwrap_or(target)
            .trim_end_matches('/');
        // Any other scheme or a path would end up in the authority or the path.
        if target.is_empty() || target.contains('/') {
            return Err(ClientError::InvalidTarget(config.target.clone()));
        }

        let url = Url::parse(&format!("http://{target}/{LIVE_PATH}"))
            .map_err(|_| ClientError::InvalidTarget(config.target.clone()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ClientError::Setup)?;

        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches the raw `/jsonlive` body. There is no retry here; the caller's
    /// next tick is the retry.
    pub async fn fetch_live(&self) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(ClientError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(ClientError::Read)?;
        debug!(url = %self.url, bytes = body.len(), "jsonlive fetched");
        Ok(body.to_vec())
    }
}
