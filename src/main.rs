//! Funko collection server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                ┌──────────────────────────────────────────────┐
//!     ──── JSON request ───▶│  net::Listener ─▶ server::Session            │
//!                           │                     │ protocol::frame        │
//!                           │                     ▼ protocol::request      │
//!                           │               server::Dispatcher             │
//!                           │                     │ store::UserLocks       │
//!                           │                     ▼                        │
//!                           │               store::UserContext ──▶ data/   │
//!     ◀── JSON response ────│  protocol::response                          │
//!                           └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use funko_server::config::{load_config, validation::validate_config, ServerConfig};
use funko_server::lifecycle::{signals::shutdown_on_signal, Shutdown};
use funko_server::net::Listener;
use funko_server::observability::{logging, metrics};
use funko_server::Server;

#[derive(Parser)]
#[command(name = "funko-server")]
#[command(about = "Per-user Funko collection server", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(long)]
    bind: Option<String>,

    /// Override storage.data_dir
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("funko-server v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        data_dir = ?config.storage.data_dir,
        write_mode = ?config.storage.write_mode,
        idle_timeout_secs = config.timeouts.idle_secs,
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

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    Server::new(&config).run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
