//! Background eviction of beacons that stopped reporting.
//!
//! The sweeper is just another client of the store: each tick it prunes
//! records older than the staleness threshold and, only if something was
//! removed, publishes the new snapshot. The threshold is longer than the
//! sweep interval so a beacon must miss a full cycle before it goes.
//!
//! Publishing is a non-blocking hand-off, so a stalled viewer can never
//! delay the sweep cadence.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::TrackingConfig;
use crate::publish::SnapshotPublisher;
use crate::stats::TrackerStats;
use crate::store::BeaconStore;

/// Periodically prunes stale beacons from a [`BeaconStore`].
pub struct EvictionSweeper {
    store: Arc<BeaconStore>,
    publisher: Arc<dyn SnapshotPublisher>,
    stats: Arc<TrackerStats>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    max_inactive: TimeDelta,
}

impl EvictionSweeper {
    /// Create a sweeper using the system clock and the tracking settings.
    pub fn new(
        store: Arc<BeaconStore>,
        publisher: Arc<dyn SnapshotPublisher>,
        stats: Arc<TrackerStats>,
        config: &TrackingConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            stats,
            clock: Arc::new(SystemClock),
            interval: config.sweep_interval(),
            max_inactive: config.max_inactive(),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Time between sweeps.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Staleness threshold.
    pub const fn max_inactive(&self) -> TimeDelta {
        self.max_inactive
    }

    /// Run one sweep as of `now`.
    ///
    /// Returns the number of beacons evicted. A snapshot is published
    /// only when that number is non-zero.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> usize {
        let removed = self.store.prune(now, self.max_inactive).await;
        if removed == 0 {
            debug!("Sweep found no inactive beacons");
            return 0;
        }

        let snapshot = self.store.versioned_snapshot().await;
        let receivers = self.publisher.publish(&snapshot);
        self.stats.record_evicted(removed);
        self.stats.record_published();

        info!(
            removed,
            version = snapshot.version,
            remaining = snapshot.records.len(),
            receivers,
            "Evicted inactive beacons"
        );
        removed
    }

    /// Sweep forever at the configured interval.
    ///
    /// The first sweep runs one full interval after start.
    pub async fn run(self) {
        let start = Instant::now()
            .checked_add(self.interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = self.interval.as_millis(),
            max_inactive_ms = self.max_inactive.num_milliseconds(),
            "Eviction sweeper started"
        );

        loop {
            ticker.tick().await;
            self.sweep_once(self.clock.now()).await;
        }
    }

    /// Run the sweeper on a background Tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
