//! Endpoint bridge demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum + tower-http layers (request ID, trace, timeout, limit)
//!                         │
//!                         ▼
//!                     create_handler bridge ── builds ──▶ DefaultRequestSource
//!                         │
//!                         ▼
//!                     filters (access log, panic recovery)
//!                         │
//!                         ▼
//!                     RequestHandler ── returns ──▶ ResponseSource
//!                         │
//!     Client Response     ▼
//!     ◀────────────── BufferedResponseWriter
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use endpoint_bridge::config::{
    ConfigError, ServerConfig, TomlPropertySource, load_config, validate_config,
};
use endpoint_bridge::http::{BridgeOptions, HttpServer};
use endpoint_bridge::lifecycle::Shutdown;
use endpoint_bridge::observability::{TracingLogger, init_tracing, metrics};
use endpoint_bridge::routes::build_routes;

#[derive(Parser)]
#[command(name = "endpoint-bridge")]
#[command(about = "Demo server for bridged endpoint handlers", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_tracing(&config.observability)?;
    tracing::info!("endpoint-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_size = config.limits.max_body_size,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let properties = Arc::new(TomlPropertySource::from_table(config.properties.clone()));
    let routes = build_routes(
        BridgeOptions::from_config(&config),
        properties,
        Arc::new(TracingLogger),
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    HttpServer::new(config, routes)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
