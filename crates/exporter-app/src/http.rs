//! HTTP side of the exporter: `/metrics`, `/health` and `/ready`.

use std::net::SocketAddr;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tracing::info;

use metric_publisher::Publisher;
use snapshot_store::SnapshotReader;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
struct AppState {
    reader: SnapshotReader,
    publisher: Publisher,
}

pub fn create_router(reader: SnapshotReader, publisher: Publisher, metrics_path: &str) -> Router {
    let state = AppState { reader, publisher };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Publishes the latest snapshot and renders it. Never waits on a scrape in
/// flight and never fails because the device is unreachable.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.reader.current();
    let body = state.publisher.render(snapshot.as_deref()).await;

    (
        StatusCode::OK,
        [("content-type", EXPOSITION_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

async fn ready_handler(State(state): State<AppState>) -> Response {
    if state.reader.current().is_some() {
        (StatusCode::OK, "ready\n").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready - no successful scrape yet\n",
        )
            .into_response()
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        "request served"
    );
    response
}

pub struct HttpServer {
    reader: SnapshotReader,
    publisher: Publisher,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    pub fn new(
        reader: SnapshotReader,
        publisher: Publisher,
        listen_addr: SocketAddr,
        metrics_path: String,
    ) -> Self {
        Self {
            reader,
            publisher,
            listen_addr,
            metrics_path,
        }
    }

    /// Serves until the shutdown flag flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.reader, self.publisher, &self.metrics_path);

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind to {}: {}", self.listen_addr, e))?;

        info!(
            addr = %self.listen_addr,
            path = %self.metrics_path,
            "starting trucki exporter http server"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("http server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("http server error: {}", e))?;

        info!("http server stopped");
        Ok(())
    }
}
