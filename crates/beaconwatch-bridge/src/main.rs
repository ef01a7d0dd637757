//! Scanner bridge for the Beaconwatch tracker.
//!
//! Relays beacon sightings to the tracker's ingest endpoint. Sightings
//! come either from a BLE scanner printing `name,mac,rssi` lines (a
//! serial device, a capture file, or stdin) or from the built-in
//! simulator.
//!
//! # Architecture
//!
//! ```text
//! scanner lines / simulator --> mpsc channel --> HTTP POST /api/beacon
//! ```
//!
//! The reader and the poster run concurrently, so a slow tracker never
//! stalls reading the serial port. Serial line settings (baud rate) are
//! configured on the device before the bridge starts, e.g. with `stty`.

mod client;
mod config;
mod error;
mod parse;
mod scanner;
mod simulate;

use beaconwatch_types::IngestRequest;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::client::{forward_reports, IngestClient};
use crate::config::{BridgeConfig, BridgeMode};
use crate::error::BridgeError;

/// Reports buffered between the reader and the poster.
const CHANNEL_CAPACITY: usize = 256;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the scanner source
/// cannot be opened or read.
#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("beaconwatch-bridge starting");

    let config = BridgeConfig::from_env()?;
    let client = IngestClient::new(&config.server_url)?;
    info!(
        endpoint = client.endpoint(),
        mode = ?config.mode,
        source = config.source,
        "Configuration loaded"
    );

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let poster = tokio::spawn(async move { forward_reports(&client, rx).await });

    let produced = match config.mode {
        BridgeMode::Serial => relay_source(&config.source, tx).await,
        BridgeMode::Simulate => {
            tokio::select! {
                queued = simulate::run_simulation(&config.simulation, tx) => Ok(queued),
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    Ok(0)
                }
            }
        }
    };

    // The sender is gone once the producer returns, so the poster drains
    // what is queued and stops.
    let delivered = poster.await?;
    info!(
        sent = delivered.sent,
        failed = delivered.failed,
        "beaconwatch-bridge stopped"
    );

    produced.map(|_| ())
}

/// Relay scanner lines from a device or file path, or stdin for `-`.
async fn relay_source(
    source: &str,
    tx: mpsc::Sender<IngestRequest>,
) -> Result<u64, BridgeError> {
    let stats = if source == "-" {
        info!("Reading scanner lines from stdin");
        scanner::relay_lines(BufReader::new(tokio::io::stdin()), tx).await?
    } else {
        let file = tokio::fs::File::open(source).await?;
        info!(source, "Reading scanner lines");
        scanner::relay_lines(BufReader::new(file), tx).await?
    };

    info!(
        forwarded = stats.forwarded,
        skipped = stats.skipped,
        "Scanner input ended"
    );
    Ok(stats.forwarded)
}
