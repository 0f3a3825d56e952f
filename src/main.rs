//! http-enc-proxy
//!
//! Listens for HTTP, picks a backend by path prefix, encrypts the
//! `properties` of JSON bodies bound for encrypting targets, and streams the
//! backend's response back.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request    ┌──────────┐   ┌──────────┐   ┌────────────┐
//!     ─────────────────▶│  http    │──▶│ routing  │──▶│ encryption │
//!                       │  server  │   │ registry │   │ transform  │
//!                       └──────────┘   └──────────┘   └─────┬──────┘
//!                                                           │
//!     Client Response   ┌──────────┐   ┌──────────┐         ▼
//!     ◀─────────────────│ response │◀──│transport │◀──── Backend
//!                       │ modifier │   │ (pooled) │
//!                       └──────────┘   └──────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use http_enc_proxy::lifecycle::{build_server, prepare_config, Overrides, Shutdown};
use http_enc_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "http-enc-proxy")]
#[command(about = "Routing reverse proxy that encrypts JSON event properties", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in targets are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configuration.
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging.
    #[arg(long)]
    debug: bool,

    /// Route prefix stripped from inbound paths before target resolution.
    #[arg(long)]
    prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = Overrides {
        port: cli.port,
        debug: cli.debug,
        route_prefix: cli.prefix,
    };

    let config = match prepare_config(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            logging::init_tracing(cli.debug);
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    logging::init_tracing(config.debug);

    tracing::info!("http-enc-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address();
    let server = build_server(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
