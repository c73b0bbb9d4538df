//! Signage daemon
//!
//! Serves slides and the API error catalog over HTTP. Every failed request
//! is answered with a single JSON error body.

mod boundary;
mod http_api;
mod slides;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use signage_common::Translator;
use signage_common::config::env::EnvParser;
use signage_common::config::load_config;

use crate::http_api::HttpState;
use crate::slides::SlideStore;

#[derive(Parser)]
#[command(name = "signaged")]
#[command(author, version, about = "Signage daemon - slide and error catalog API")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SIGNAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Directory of slide files to load at startup
    #[arg(short, long)]
    slides_dir: Option<PathBuf>,

    /// Include internal diagnostics in error responses
    #[arg(long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let mut env = EnvParser::new();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(env.get_log_level("LOG_LEVEL", "info").value)
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    for e in env.errors() {
        warn!("{}", e);
    }

    info!("Starting signage daemon...");

    let loaded = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let mut config = loaded.config;
    let mut debug_source = loaded.debug_source;

    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if let Some(dir) = cli.slides_dir {
        config.server.slides_dir = Some(dir);
    }
    if cli.debug {
        config.api.debug = true;
        debug_source = signage_common::config::ConfigSource::CommandLine;
    }

    if config.api.debug {
        warn!(
            "API debug mode enabled ({}); error responses include internal details",
            debug_source
        );
    }

    let store = SlideStore::new(config.server.max_slides);
    if let Some(ref dir) = config.server.slides_dir {
        store
            .load_dir(dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load slides from {:?}: {}", dir, e))?;
    } else {
        info!("No slides directory configured; starting with an empty store");
    }

    let state = HttpState {
        store: Arc::new(store),
        version: env!("CARGO_PKG_VERSION"),
        started_at: Instant::now(),
    };
    let router = http_api::create_router(state, Translator::new(config.api.debug));

    let listener = tokio::net::TcpListener::bind(config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;

    http_api::serve(listener, router, shutdown_signal()).await?;

    info!("Signage daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
