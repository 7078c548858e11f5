//! Request admission gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ request ID / trace / timeout
//!                       │
//!                       ▼
//!                   identity resolver ── cookie `token` or Bearer header
//!                       │                (invalid → anonymous, never rejects)
//!                       ▼
//!                   admission controller ── tier table ── decision provider
//!                       │          │
//!                       │          └──▶ 403 (bot / policy-shield / rate-limit)
//!                       │               500 (provider failure or timeout)
//!                       ▼
//!                   downstream routes
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use admission_gateway::config::{self, schema::PLACEHOLDER_JWT_SECRET};
use admission_gateway::lifecycle::{shutdown_on_signal, Shutdown};
use admission_gateway::observability::{logging, metrics};
use admission_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "admission-gateway")]
#[command(about = "Identity-aware admission control in front of the API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::default_config()?,
    };

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("admission-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret == PLACEHOLDER_JWT_SECRET {
        tracing::warn!("auth.jwt_secret is the built-in placeholder; set it or GATEWAY_JWT_SECRET");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        provider = ?config.admission.provider.kind,
        provider_timeout_ms = config.admission.provider.timeout_ms,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
