//! Failover Gateway binary.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use failover_gateway::config::load_config;
use failover_gateway::lifecycle::{wait_for_shutdown_signal, Shutdown};
use failover_gateway::observability::{logging, metrics};
use failover_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "failover-gateway")]
#[command(about = "Reverse-proxy gateway with health checks, circuit breaking and failover", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Log level or filter directive; overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    logging::init_logging(level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "failover-gateway starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.urls.len(),
        rate_limit = config.rate_limit.enabled,
        cache = config.cache.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    let server = GatewayServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
