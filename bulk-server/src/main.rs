//! Bulk API server
//!
//! Serves the resources described by a JSON configuration file over a
//! single bulk endpoint backed by in-memory tables.
//!
//! Usage:
//!   bulk-server --config bulk.json --port 4000
//!
//! Data lives in process memory and is lost on exit.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use bulk_engine::AppConfig;
use bulk_server::{BULK_PATH, BearerTokenGate, build_router};
use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "bulk-server")]
#[command(about = "Bulk CRUD API server")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "4000")]
    port: u16,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "bulk.json")]
    config: PathBuf,

    /// Require `Authorization: Bearer <token>` on every request
    #[arg(long)]
    api_token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Bulk server starting...");
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    let mut builder = config.into_builder().context("Invalid configuration")?;
    match args.api_token {
        Some(token) => builder = builder.gate(BearerTokenGate::new(token)),
        None => warn!("No --api-token given, the endpoint is open to every caller"),
    }
    let app = Arc::new(builder.build().context("Failed to assemble application")?);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", args.port))?;
    info!("Bulk endpoint listening on http://0.0.0.0:{}{}", args.port, BULK_PATH);

    axum::serve(listener, build_router(app))
        .await
        .context("HTTP server failed")?;
    Ok(())
}
