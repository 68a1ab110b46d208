//! HTTP relay.
//!
//! Receives messages on one HTTP endpoint and relays each to a configured
//! sender, answering the original request with the relay outcome.
//!
//! ```text
//!     Client ──▶ HttpReceiver ──▶ (ForwardingReceiver) ──▶ RelayHandler ──▶ HttpSender ──▶ Target
//!        ◀──────── mapped status ◀──── resolve(outcome) ◀──────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use http_messaging::config::load_config;
use http_messaging::lifecycle::shutdown_signal;
use http_messaging::observability::{logging, metrics};
use http_messaging::Relay;

/// Relay messages between HTTP endpoints.
#[derive(Parser, Debug)]
#[command(name = "http-relay", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init_logging(&config.observability.log_level)?;

    if cli.check {
        tracing::info!(path = %cli.config.display(), "Configuration is valid");
        return Ok(());
    }

    tracing::info!(
        path = %cli.config.display(),
        receiver = %config.receiver.name,
        senders = config.senders.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let relay = Relay::from_config(&config)?;
    relay.start().await?;
    tracing::info!(addresses = ?relay.http_receiver().local_addrs(), "Relay listening");

    shutdown_signal().await;

    relay.stop().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
