//! Tracker service binary for Beaconwatch.
//!
//! Wires the beacon store, eviction sweeper, and HTTP/`WebSocket`
//! server together and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$BEACONWATCH_CONFIG` or `beaconwatch.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the shared tracker state
//! 4. Start the eviction sweeper
//! 5. Serve the ingest API and viewer feed until shutdown

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use beaconwatch_core::config::TrackerConfig;
use beaconwatch_observer::{start_server, AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServiceError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "beaconwatch.yaml";

/// Application entry point for the tracker service.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot
/// bind its address.
#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // 1. Load configuration.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("beaconwatch-service starting");
    info!(
        source = %config_source,
        host = config.server.host,
        port = config.server.port,
        sweep_interval_ms = config.tracking.sweep_interval_ms,
        max_inactive_ms = config.tracking.max_inactive_ms,
        "Configuration loaded"
    );

    // 3. Build shared state.
    let state = Arc::new(AppState::from_config(&config));

    // 4. Start the eviction sweeper.
    let sweeper = state.sweeper(&config).spawn();
    info!("Eviction sweeper started");

    // 5. Serve until Ctrl-C.
    let server_config = ServerConfig::from(&config.server);
    let result = start_server(&server_config, Arc::clone(&state), shutdown_signal()).await;

    sweeper.abort();
    info!(
        beacons = state.store.len().await,
        "beaconwatch-service stopped"
    );

    result.map_err(ServiceError::from)
}

/// Load configuration from the configured path, or defaults if it is absent.
///
/// Environment overrides and validation apply in both cases.
fn load_config() -> Result<(TrackerConfig, String), ServiceError> {
    let path = std::env::var("BEACONWATCH_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        let config = TrackerConfig::from_file(&path)?;
        return Ok((config, path.display().to_string()));
    }

    let mut config = TrackerConfig::default();
    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok((config, String::from("defaults")))
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    shutdown_on(tokio::signal::ctrl_c()).await;
}

/// Resolve once `signal` reports success.
///
/// If the listener fails this never resolves, so the server keeps running
/// instead of stopping at once.
async fn shutdown_on(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn failed_signal_listener_never_triggers_shutdown() {
        let failed = async { Err(io::Error::other("no signal handler")) };
        let outcome = tokio::time::timeout(Duration::from_secs(3600), shutdown_on(failed)).await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn received_signal_triggers_shutdown() {
        let outcome =
            tokio::time::timeout(Duration::from_secs(1), shutdown_on(async { Ok(()) })).await;
        assert!(outcome.is_ok());
    }
}
