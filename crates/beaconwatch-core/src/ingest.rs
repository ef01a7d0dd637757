//! Applying inbound beacon reports.
//!
//! [`Ingestor`] is the transport-independent half of the ingest
//! endpoint: validate, upsert, then publish a fresh snapshot. Every
//! accepted report triggers a broadcast; the sweep broadcasts only when
//! it removed something.

use std::sync::Arc;

use beaconwatch_types::{BeaconRecord, IngestRequest, ValidationError};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::publish::SnapshotPublisher;
use crate::stats::TrackerStats;
use crate::store::BeaconStore;

/// Validates reports and applies them to the store.
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<BeaconStore>,
    publisher: Arc<dyn SnapshotPublisher>,
    stats: Arc<TrackerStats>,
    clock: Arc<dyn Clock>,
}

impl Ingestor {
    /// Create an ingestor using the system clock.
    pub fn new(
        store: Arc<BeaconStore>,
        publisher: Arc<dyn SnapshotPublisher>,
        stats: Arc<TrackerStats>,
    ) -> Self {
        Self {
            store,
            publisher,
            stats,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and apply one report, then publish the full snapshot.
    ///
    /// The store lock is released before publishing; the snapshot's
    /// version lets the publisher discard it if a newer one already went
    /// out.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] for a malformed report; the store
    /// is left untouched and nothing is published.
    pub async fn ingest(&self, request: IngestRequest) -> Result<BeaconRecord, ValidationError> {
        let report = match request.validate() {
            Ok(report) => report,
            Err(e) => {
                self.reject(&e);
                return Err(e);
            }
        };

        let record = self.store.upsert(&report, self.clock.now()).await;
        self.stats.record_accepted();

        let snapshot = self.store.versioned_snapshot().await;
        let receivers = self.publisher.publish(&snapshot);
        self.stats.record_published();
        debug!(
            id = %record.id,
            version = snapshot.version,
            beacons = snapshot.records.len(),
            receivers,
            "Snapshot published after ingest"
        );

        Ok(record)
    }

    /// Count and log a rejected report.
    ///
    /// Also used by transports for bodies that never parse into an
    /// [`IngestRequest`].
    pub fn reject(&self, error: &ValidationError) {
        self.stats.record_rejected();
        warn!(error = %error, "Beacon report rejected");
    }
}
