//! HTTP client for the tracker's ingest endpoint.
//!
//! [`forward_reports`] drains the report channel and posts each report
//! with `reqwest`. A failed post is logged and the next report is tried;
//! the bridge never stops because the tracker is briefly unreachable.

use std::time::Duration;

use beaconwatch_types::IngestRequest;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::BridgeError;

/// Per-request deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts reports to `{server_url}/api/beacon`.
pub struct IngestClient {
    client: reqwest::Client,
    endpoint: String,
}

impl IngestClient {
    /// Create a client for the tracker at `server_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Http`] if the HTTP client cannot be built.
    pub fn new(server_url: &str) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BridgeError::Http(format!("client build failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: ingest_endpoint(server_url),
        })
    }

    /// The full ingest URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one report.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Http`] if the request fails in transit, or
    /// [`BridgeError::Rejected`] if the tracker answers with an error
    /// status.
    pub async fn submit(&self, report: &IngestRequest) -> Result<(), BridgeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(|e| BridgeError::Http(format!("ingest request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(BridgeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Totals from one forwarding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwardStats {
    /// Reports the tracker accepted.
    pub sent: u64,
    /// Reports that failed in transit or were rejected.
    pub failed: u64,
}

/// Post every report received on `reports` until the channel closes.
pub async fn forward_reports(
    client: &IngestClient,
    mut reports: mpsc::Receiver<IngestRequest>,
) -> ForwardStats {
    let mut stats = ForwardStats::default();
    while let Some(report) = reports.recv().await {
        match client.submit(&report).await {
            Ok(()) => {
                stats.sent = stats.sent.saturating_add(1);
                debug!(
                    id = report.id.as_deref().unwrap_or_default(),
                    rssi = ?report.signal_strength,
                    "Report sent"
                );
            }
            Err(e) => {
                stats.failed = stats.failed.saturating_add(1);
                warn!(
                    id = report.id.as_deref().unwrap_or_default(),
                    error = %e,
                    "Report not delivered"
                );
            }
        }
    }
    stats
}

/// Build the ingest URL from a base URL, tolerating a trailing slash.
fn ingest_endpoint(server_url: &str) -> String {
    format!("{}/api/beacon", server_url.trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(
            ingest_endpoint("http://localhost:3001"),
            "http://localhost:3001/api/beacon"
        );
        assert_eq!(
            ingest_endpoint("http://tracker:9000/"),
            "http://tracker:9000/api/beacon"
        );
        let client = IngestClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:3001/api/beacon");
    }

    #[tokio::test]
    async fn unreachable_tracker_counts_failures_and_continues() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = IngestClient::new("http://127.0.0.1:9").unwrap();
        let (tx, rx) = mpsc::channel(4);
        tx.send(IngestRequest::new("AA:01", None, -40)).await.unwrap();
        tx.send(IngestRequest::new("AA:02", None, -50)).await.unwrap();
        drop(tx);

        let stats = forward_reports(&client, rx).await;
        assert_eq!(stats, ForwardStats { sent: 0, failed: 2 });
    }
}
