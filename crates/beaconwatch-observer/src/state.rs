//! Shared application state for the Observer API server.
//!
//! [`AppState`] bundles the beacon store, the viewer broadcaster, and the
//! ingestor that ties them together. The same store and broadcaster are
//! handed to the eviction sweeper so ingest and eviction publish through
//! one channel.

use std::sync::Arc;

use beaconwatch_core::clock::{Clock, SystemClock};
use beaconwatch_core::config::TrackerConfig;
use beaconwatch_core::estimator::PositionEstimator;
use beaconwatch_core::ingest::Ingestor;
use beaconwatch_core::publish::SnapshotPublisher;
use beaconwatch_core::stats::TrackerStats;
use beaconwatch_core::store::BeaconStore;
use beaconwatch_core::sweeper::EvictionSweeper;

use crate::broadcast::Broadcaster;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The authoritative beacon table.
    pub store: Arc<BeaconStore>,
    /// Fan-out to connected viewers.
    pub broadcaster: Arc<Broadcaster>,
    /// Validates and applies inbound reports.
    pub ingestor: Ingestor,
    /// Running counters.
    pub stats: Arc<TrackerStats>,
    /// Time source shared with the ingestor.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire a state from its parts.
    pub fn new(
        store: Arc<BeaconStore>,
        broadcaster: Arc<Broadcaster>,
        stats: Arc<TrackerStats>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ingestor = Ingestor::new(
            Arc::clone(&store),
            Arc::clone(&broadcaster) as Arc<dyn SnapshotPublisher>,
            Arc::clone(&stats),
        )
        .with_clock(Arc::clone(&clock));

        Self {
            store,
            broadcaster,
            ingestor,
            stats,
            clock,
        }
    }

    /// Build an empty tracker from configuration using the system clock.
    pub fn from_config(config: &TrackerConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(BeaconStore::new(PositionEstimator::new(&config.estimator)));
        let broadcaster = Arc::new(Broadcaster::new(config.tracking.broadcast_capacity));
        let stats = Arc::new(TrackerStats::new(clock.now()));
        Self::new(store, broadcaster, stats, clock)
    }

    /// Create the eviction sweeper for this state's store and viewers.
    pub fn sweeper(&self, config: &TrackerConfig) -> EvictionSweeper {
        EvictionSweeper::new(
            Arc::clone(&self.store),
            Arc::clone(&self.broadcaster) as Arc<dyn SnapshotPublisher>,
            Arc::clone(&self.stats),
            &config.tracking,
        )
        .with_clock(Arc::clone(&self.clock))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}
