//! svcregd — the service registry daemon.
//!
//! Loads configuration, assembles the service store (memory or redb,
//! optionally wrapped for health polling) and serves the HTTP API until
//! Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! svcregd --config /etc/svcreg/config.toml --store redb --poll true
//! ```
//!
//! Precedence: command-line flags, then `SVCREG_*` environment variables,
//! then the config file, then built-in defaults.

mod config;
mod store;

use std::future::{Future, IntoFuture};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_CONFIG_PATH, RegistryConfig, StoreKind};

/// How long in-flight requests get to finish once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "svcregd", about = "Service registry daemon")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "SVCREG_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address to bind the API server to.
    #[arg(long, env = "SVCREG_ADDRESS")]
    address: Option<String>,

    /// OpenAPI document served at /spec.
    #[arg(long, env = "SVCREG_SPEC_PATH")]
    spec_path: Option<PathBuf>,

    /// Storage backend.
    #[arg(long, env = "SVCREG_STORE_TYPE", value_enum)]
    store: Option<StoreKind>,

    /// Database file for the redb backend.
    #[arg(long, env = "SVCREG_STORE_PATH")]
    store_path: Option<PathBuf>,

    /// Enable health polling.
    #[arg(long, env = "SVCREG_POLLING_ENABLED")]
    poll: Option<bool>,

    /// Health polling interval, e.g. "30s".
    #[arg(long, env = "SVCREG_POLLING_INTERVAL")]
    poll_interval: Option<String>,
}

impl Cli {
    /// Overlay flags and environment onto the file config.
    fn apply(&self, config: &mut RegistryConfig) {
        if let Some(address) = &self.address {
            config.address = Some(address.clone());
        }
        if let Some(spec_path) = &self.spec_path {
            config.spec_path = Some(spec_path.clone());
        }
        if let Some(kind) = self.store {
            config.store.kind = Some(kind);
        }
        if let Some(path) = &self.store_path {
            config.store.path = Some(path.clone());
        }
        if let Some(enabled) = self.poll {
            config.polling.enabled = Some(enabled);
        }
        if let Some(interval) = &self.poll_interval {
            config.polling.interval = Some(interval.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,svcreg=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RegistryConfig::load(&cli.config)?;
    cli.apply(&mut config);
    let settings = config.resolve()?;

    info!("service registry starting");

    let store = store::build_store(&settings)?;
    info!(store = %store.describe(), "service store initialized");

    let router = svcreg_api::build_router(Arc::clone(&store), settings.spec_path.clone());
    let listener = TcpListener::bind(settings.address).await?;
    info!(addr = %settings.address, spec = ?settings.spec_path, "API server starting");

    serve_with_grace(listener, router, shutdown_signal(), SHUTDOWN_GRACE).await?;

    if let Err(e) = store.close() {
        error!(error = %e, "failed to close service store");
    }

    info!("shutdown complete");
    Ok(())
}

/// Serve until `signal` fires, then give open connections `grace` to
/// finish before dropping them.
async fn serve_with_grace(
    listener: TcpListener,
    router: Router,
    signal: impl Future<Output = ()> + Send + 'static,
    grace: Duration,
) -> std::io::Result<()> {
    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            let _ = stopping_tx.send(true);
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => result,
        _ = async {
            if stopping_rx.wait_for(|stopping| *stopping).await.is_err() {
                // Server future finished first; let the other branch win.
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(grace).await;
        } => {
            warn!(?grace, "graceful shutdown timed out, dropping open connections");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler the server runs until killed.
        error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
