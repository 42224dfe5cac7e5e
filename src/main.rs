//! api-guard: HTTP request-defense pipeline for a multi-tenant commerce API.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                    REQUEST GUARD                      │
//!                  │                                                       │
//!   Client request │  ┌──────────┐  ┌───────────┐  ┌──────────────┐       │
//!   ───────────────┼─▶│ sanitize │─▶│ signature │─▶│ rate limiter │       │
//!                  │  └──────────┘  │   scan    │  └──────┬───────┘       │
//!                  │                └───────────┘         │               │
//!                  │                                      ▼               │
//!                  │  ┌──────────┐  ┌───────────┐  ┌──────────────┐       │
//!   Business       │  │ handler  │◀─│ validator │◀─│  principal   │       │
//!   handler        │  └──────────┘  └───────────┘  │  resolver    │       │
//!                  │                                └──────────────┘      │
//!                  │                                                       │
//!                  │  ┌────────────────────────────────────────────────┐  │
//!                  │  │            Cross-Cutting Concerns               │  │
//!                  │  │  config · audit log · metrics · lifecycle       │  │
//!                  │  └────────────────────────────────────────────────┘  │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use api_guard::auth::MemoryPrincipalStore;
use api_guard::config::{loader, GuardConfig};
use api_guard::http::GuardServer;
use api_guard::lifecycle::Shutdown;
use api_guard::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "api-guard", about = "Request-defense pipeline for a commerce API")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => loader::load_config(path)?,
        None => GuardConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        signature_scan = config.security.signature_scan,
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

    let principals = Arc::new(MemoryPrincipalStore::new());
    let shutdown = Shutdown::new();

    let server = GuardServer::new(config, principals, None);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
