//! Data ingestion service.
//!
//! # Architecture Overview
//!
//! ```text
//!   API client ── POST /data ──▶ token guard ──▶ data::ingest ──▶ RecordStore (replace-all txn)
//!                                                                      │
//!   Browser ──── GET / ────────▶ session guard ─▶ data::show_table ◀───┘
//!      │
//!      └──────── POST /login ──▶ login guard (blocked?) ─▶ UserStore ─▶ SessionStore
//!
//!   Cross-cutting: config · tracing/metrics · request id · timeout · graceful shutdown
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use data_ingest::config::load_runtime_config;
use data_ingest::lifecycle::startup::build_state;
use data_ingest::observability::{logging, metrics};
use data_ingest::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "data-ingest")]
#[command(about = "Record ingestion service with session and token authentication", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "ingest.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let config = load_runtime_config(&args.config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("data-ingest v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.database.url,
        tls = config.listener.tls.is_some(),
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

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(build_state(config)?);

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            server.run_tls(addr, &tls, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
