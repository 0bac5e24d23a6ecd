//! Time-range reverse proxy (v1)
//!
//! Exposes one internal, network-restricted API to external callers through
//! a validating gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    RANGE PROXY                        │
//!   Client Request   │  ┌─────────┐   ┌───────────┐   ┌──────────────┐      │
//!   ─────────────────┼─▶│  http   │──▶│  request  │──▶│    query     │      │
//!                    │  │ server  │   │ GET/POST  │   │  validator   │      │
//!                    │  └─────────┘   └───────────┘   └──────┬───────┘      │
//!                    │                                       ▼              │
//!                    │                               ┌──────────────┐       │
//!                    │                               │  resilience  │       │
//!                    │                               │ timeout tier │       │
//!                    │                               └──────┬───────┘       │
//!                    │                                       ▼              │
//!   Client Response  │  ┌─────────┐   ┌───────────┐   ┌──────────────┐      │
//!   ◀────────────────┼──│  CORS   │◀──│ response  │◀──│   backend    │◀─────┼── Backend
//!                    │  │ headers │   │ normalize │   │   client     │      │
//!                    │  └─────────┘   └───────────┘   └──────────────┘      │
//!                    │  any failure ──▶ error mapper ──▶ {"error": ...}     │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use range_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use range_proxy::http::HttpServer;
use range_proxy::lifecycle::{signals, Shutdown};
use range_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "range-proxy")]
#[command(about = "Validating reverse proxy for time-range queries", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override backend.url.
    #[arg(long)]
    backend_url: Option<String>,
}

impl Args {
    fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(url) = &self.backend_url {
            config.backend.url = url.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match args.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("range-proxy: {}", e);
            std::process::exit(2);
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!("range-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.endpoint.path,
        backend = %config.backend.url,
        tiers = config.timeouts.tiers.len(),
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
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
