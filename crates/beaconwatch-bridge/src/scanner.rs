//! Reading scanner output line by line.
//!
//! Bytes are decoded lossily: serial links occasionally deliver a
//! corrupted byte, and one bad line must not end the relay.

use beaconwatch_types::IngestRequest;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::BridgeError;
use crate::parse::{parse_scan_line, LineError};

/// Totals from one relay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Lines turned into reports.
    pub forwarded: u64,
    /// Lines that were not sightings.
    pub skipped: u64,
}

/// Parse every line from `reader` and queue a report for each sighting.
///
/// Returns at end of input or when the receiving side closes.
///
/// # Errors
///
/// Returns [`BridgeError::Io`] if reading fails.
pub async fn relay_lines<R>(
    mut reader: R,
    reports: mpsc::Sender<IngestRequest>,
) -> Result<RelayStats, BridgeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = RelayStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        match parse_scan_line(&line) {
            Ok(scan) => {
                if reports.send(scan.into_request()).await.is_err() {
                    debug!("Report channel closed, stopping relay");
                    break;
                }
                stats.forwarded = stats.forwarded.saturating_add(1);
            }
            Err(LineError::Blank) => {}
            Err(e) => {
                stats.skipped = stats.skipped.saturating_add(1);
                info!(line = %line.trim(), reason = %e, "Ignoring scanner line");
            }
        }
    }

    Ok(stats)
}
