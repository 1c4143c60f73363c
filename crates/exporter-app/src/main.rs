use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use exporter_app::systemd::{self, Watchdog};
use exporter_app::{Cli, ExporterConfig, HttpServer};
use metric_publisher::Publisher;
use poller_actor::{ActorConfig, PollerActor};
use trucki_client::TruckiClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting trucki exporter");

    let cli = Cli::parse();
    let config = ExporterConfig::load_with_cli(&cli).context("load config failed")?;
    config.validate().context("config validation failed")?;
    if config.uses_default_interval() {
        info!("no custom scrape interval provided, defaulting to 5 seconds");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let client = TruckiClient::new(&config.client_config()).context("trucki client init failed")?;
    info!(url = %client.url(), "scraping trucki stick");

    let (writer, reader) = snapshot_store::channel();
    let poller = PollerActor::new(
        client,
        writer,
        shutdown_rx.clone(),
        ActorConfig {
            poll_interval: config.poll_interval()?,
        },
    )
    .context("poller init failed")?;
    let poller_handle = tokio::spawn(poller.run());

    let server = HttpServer::new(
        reader,
        Publisher::new(),
        config.listen_addr(),
        config.metrics_path.clone(),
    );
    let mut server_handle = tokio::spawn(server.run(shutdown_rx.clone()));

    systemd::notify_ready();
    let mut watchdog = Watchdog::from_env();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let outcome = loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(err) = signal {
                    warn!(error = %err, "ctrl-c listener failed");
                }
                info!("shutdown signal received");
                systemd::notify_stopping();
                let _ = shutdown_tx.send(true);
                break server_outcome((&mut server_handle).await);
            }
            joined = &mut server_handle => {
                let _ = shutdown_tx.send(true);
                break server_outcome(joined);
            }
            _ = watchdog.tick() => watchdog.ping(),
        }
    };

    if let Err(err) = poller_handle.await {
        warn!(error = %err, "poller task join failed");
    }
    outcome
}

fn server_outcome(joined: Result<Result<()>, JoinError>) -> Result<()> {
    joined.unwrap_or_else(|err| Err(anyhow::anyhow!("http server task failed: {err}")))
}
