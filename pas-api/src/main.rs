//! pas-api - Phone Address Service
//!
//! Stores phone-number-to-address associations and serves them over HTTP.
//! Configuration: command line / environment > TOML file > defaults.

use anyhow::{Context, Result};
use clap::Parser;
use pas_common::config::{ConfigOverrides, LogFormat, TomlConfig};
use pas_common::kv::SqliteKvStore;
use pas_common::KeyValueStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use pas_api::{build_router, AppState};

/// Command-line arguments for pas-api
#[derive(Parser, Debug)]
#[command(name = "pas-api")]
#[command(about = "Phone address microservice")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PAS_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP listener to
    #[arg(long, env = "PAS_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PAS_PORT")]
    port: Option<u16>,

    /// Store database file
    #[arg(short, long, env = "PAS_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PAS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json or text)
    #[arg(long, env = "PAS_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) = TomlConfig::resolve(args.config.as_deref())?;
    let config = config.apply_overrides(ConfigOverrides {
        host: args.host,
        port: args.port,
        database_path: args.database,
        log_level: args.log_level,
        log_format: args.log_format,
    });
    config.validate()?;

    pas_common::logging::init_tracing(&config.logging)?;

    // Log identification immediately after tracing init, before store delays
    info!(
        "Starting Phone Address Service (pas-api) v{}",
        env!("CARGO_PKG_VERSION")
    );
    config_source.log();
    info!("Store database: {}", config.store.database_path.display());

    let store: Arc<dyn KeyValueStore> = match SqliteKvStore::connect(&config.store).await {
        Ok(store) => {
            info!("✓ Connected to key-value store");
            Arc::new(store)
        }
        Err(e) => {
            error!("Failed to connect to key-value store: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(store.clone());
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("pas-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
