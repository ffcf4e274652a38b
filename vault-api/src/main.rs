//! vault-api - WatchMe Vault file exchange service
//!
//! Receives audio recordings and analysis results keyed by device and date,
//! and serves them back to dashboards and viewers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vault_api::{build_router, AppState};
use vault_common::config::{ConfigOverrides, VaultConfig};

/// Command-line arguments for vault-api
#[derive(Parser, Debug)]
#[command(name = "vault-api")]
#[command(about = "File exchange API for recordings and analysis results")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "WATCHME_VAULT_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "WATCHME_VAULT_BIND")]
    bind: Option<String>,

    /// Root folder holding device directories
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "WATCHME_VAULT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = VaultConfig::resolve(ConfigOverrides {
        root_folder: args.root_folder,
        bind_addr: args.bind,
        port: args.port,
        config_path: args.config,
    })
    .context("Failed to load configuration")?;

    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "vault_api={level},vault_common={level},tower_http={level}",
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting WatchMe Vault (vault-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", config.root_folder.display());
    if !config.root_folder.exists() {
        warn!(
            "Root folder does not exist yet, it will be created on first upload: {}",
            config.root_folder.display()
        );
    }

    let addr = config.socket_addr();
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("vault-api listening on http://{}", addr);
    info!("Status page: http://{}/status", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
