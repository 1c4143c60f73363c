use clap::Parser;

/// Command line flags. Anything set here wins over the config file and the
/// environment.
#[derive(Debug, Default, Parser)]
#[command(name = "trucki-exporter", version, about = "Prometheus exporter for a Trucki stick")]
pub struct Cli {
    /// HTTP listen port for the metrics endpoint, eg. -p 8080
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Trucki stick IP address or hostname, eg. -t 192.168.178.58
    #[arg(short = 't', long = "target")]
    pub target: Option<String>,

    /// Scrape interval in seconds, eg. -i 15
    #[arg(short = 'i', long = "interval", allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Path to a TOML or JSON config file
    #[arg(long = "config")]
    pub config: Option<String>,
}
