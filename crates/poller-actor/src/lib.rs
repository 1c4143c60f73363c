use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use jsonlive_parser::{decode_jsonlive, normalize, DecodeError};
use snapshot_store::SnapshotWriter;
use trucki_client::{ClientError, TruckiClient};
use types::NormalizedSnapshot;

#[derive(Debug, Clone)]
pub struct ActorConfig {
    pub poll_interval: Duration,
}

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("poll interval must be greater than zero")]
    InvalidInterval,
    #[error("scrape failed: {0}")]
    Scrape(#[from] ClientError),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Polls one Trucki stick on a fixed interval and keeps the snapshot store
/// current. Cycles never overlap: the wait starts once a cycle is done.
pub struct PollerActor {
    client: TruckiClient,
    writer: SnapshotWriter,
    shutdown: watch::Receiver<bool>,
    config: ActorConfig,
}

impl PollerActor {
    pub fn new(
        client: TruckiClient,
        writer: SnapshotWriter,
        shutdown: watch::Receiver<bool>,
        config: ActorConfig,
    ) -> Result<Self, PollerError> {
        if config.poll_interval.is_zero() {
            return Err(PollerError::InvalidInterval);
        }

        Ok(Self {
            client,
            writer,
            shutdown,
            config,
        })
    }

    /// Runs until shutdown is requested. Upstream failures are logged and the
    /// loop carries on with the previous snapshot left in place.
    pub async fn run(mut self) {
        let mut iteration = 0u64;

        loop {
            if *self.shutdown.borrow() {
                info!(url = %self.client.url(), "poller shutdown requested");
                break;
            }

            let cycle_start = Instant::now();
            let outcome = self.cycle().await;
            iteration = iteration.wrapping_add(1);
            let elapsed = cycle_start.elapsed();

            match outcome {
                Ok(()) => info!(
                    iteration,
                    elapsed_ms = elapsed.as_millis(),
                    "poll cycle complete"
                ),
                Err(err) => warn!(
                    url = %self.client.url(),
                    iteration,
                    elapsed_ms = elapsed.as_millis(),
                    timeout = matches!(&err, PollerError::Scrape(inner) if inner.is_timeout()),
                    error = %err,
                    "failed to scrape trucki stick"
                ),
            }

            // A dropped shutdown sender disables the second branch.
            tokio::select! {
                _ = sleep(self.config.poll_interval) => {},
                Ok(()) = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        info!(url = %self.client.url(), "poller shutdown requested");
                        break;
                    }
                }
            }
        }
    }

    /// One scrape. The store is only touched when every stage succeeds.
    pub async fn cycle(&self) -> Result<(), PollerError> {
        let snapshot = self.poll_once().await?;
        self.writer.replace(snapshot);
        Ok(())
    }

    /// Fetches, decodes and normalizes without touching the store.
    pub async fn poll_once(&self) -> Result<NormalizedSnapshot, PollerError> {
        let body = self.client.fetch_live().await?;
        let raw = decode_jsonlive(&body)?;
        let (snapshot, diagnostics) = normalize(&raw);
        for diagnostic in &diagnostics {
            warn!(error = %diagnostic, "field normalization failed");
        }
        Ok(snapshot)
    }
}
