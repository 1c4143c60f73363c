pub mod cli;
pub mod config;
pub mod http;
pub mod systemd;

pub use cli::Cli;
pub use config::ExporterConfig;
pub use http::{create_router, HttpServer};
