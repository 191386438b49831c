//! site-forms: quote request and newsletter subscription backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser form          ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http::server ─▶ http::request ─▶ forms     │
//!                           │                                    │         │
//!                           │                                    ▼         │
//!                           │   security::rate_limit ◀── submissions ──▶ notifications
//!                           │            │                       │         │
//!                           │            ▼                       ▼         │
//!                           │         storage (sqlite / postgres / memory) │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use site_forms::config::load_config;
use site_forms::lifecycle::{wait_for_signal, Shutdown};
use site_forms::observability::{logging, metrics};
use site_forms::{notifications, storage, HttpServer};

#[derive(Parser)]
#[command(name = "site-forms")]
#[command(about = "Quote request and newsletter subscription backend", long_about = None)]
struct Args {
    /// TOML configuration file; defaults and environment apply without one.
    #[arg(short, long, env = "SITE_FORMS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref(), |key| std::env::var(key).ok())?;
    logging::init_logging(&config.observability)?;

    tracing::info!("site-forms v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        storage = config.storage.driver.as_str(),
        mail_transport = ?config.notifications.transport,
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

    let store = storage::connect(&config.storage).await?;
    let mailer = notifications::build_mailer(&config.notifications)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let server = HttpServer::new(config, store, mailer);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
