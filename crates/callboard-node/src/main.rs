//! Callboard Node - real-time call event pipeline.
//!
//! This is the main entry point for running a Callboard node.

use anyhow::Context;
use callboard_node::api::{create_router, AppState};
use callboard_node::config::NodeConfig;
use callboard_node::observability::{init_logging, LogFormat};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Callboard Node - real-time call event pipeline
#[derive(Parser, Debug)]
#[command(name = "callboard-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API listen address
    #[arg(long)]
    api_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(addr) = self.api_addr {
            config.api_addr = addr;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config =
        NodeConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    init_logging(&config.log_level, config.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Callboard node");
    tracing::info!(
        api_addr = %config.api_addr,
        transport = ?config.transport,
        base_delay_ms = config.reconnect.base_delay_ms,
        max_attempts = config.reconnect.max_attempts,
        "Node configuration"
    );

    let state = AppState::from_config(&config).context("failed to build realtime pipeline")?;
    state
        .binding
        .activate()
        .context("failed to activate realtime binding")?;

    let listener = tokio::net::TcpListener::bind(config.api_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.api_addr))?;

    tracing::info!("Node is ready. Press Ctrl+C to stop.");

    axum::serve(listener, create_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    state.binding.deactivate();
    tracing::info!("Callboard node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
