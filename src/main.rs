//! lemcache server binary
//!
//! Parses flags, sets up logging, then accepts memcache clients until
//! Ctrl+C.

use clap::Parser;
use lemcache::config::Cli;
use lemcache::connection::ConnectionStats;
use lemcache::server::Server;
use lemcache::storage::{start_expiry_sweeper, StorageEngine};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(version = lemcache::VERSION, "Starting lemcache");

    let storage = Arc::new(StorageEngine::new());
    let _sweeper = start_expiry_sweeper(Arc::clone(&storage));

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        address = %config.bind_address(),
        max_item_size = config.max_item_size,
        max_connections = config.max_connections,
        "Listening"
    );

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = Server::new(listener, &config, storage, Arc::clone(&stats)).run() => {}
        _ = shutdown => {}
    }

    info!(
        served = stats
            .connections_accepted
            .load(std::sync::atomic::Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}
