//! Running counters for the status endpoint.
//!
//! All fields are atomics so ingest handlers and the sweep task can bump
//! them without touching the store lock.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Process-lifetime tracker counters.
#[derive(Debug)]
pub struct TrackerStats {
    started_at: DateTime<Utc>,
    reports_accepted: AtomicU64,
    reports_rejected: AtomicU64,
    beacons_evicted: AtomicU64,
    snapshots_published: AtomicU64,
}

/// Point-in-time copy of [`TrackerStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// When the tracker started.
    pub started_at: DateTime<Utc>,
    /// Whole seconds since start.
    pub uptime_seconds: i64,
    /// Reports applied to the store.
    pub reports_accepted: u64,
    /// Reports discarded by validation.
    pub reports_rejected: u64,
    /// Beacons removed by the eviction sweep.
    pub beacons_evicted: u64,
    /// Snapshots handed to the publisher.
    pub snapshots_published: u64,
}

impl TrackerStats {
    /// Start counting from `started_at`.
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            reports_accepted: AtomicU64::new(0),
            reports_rejected: AtomicU64::new(0),
            beacons_evicted: AtomicU64::new(0),
            snapshots_published: AtomicU64::new(0),
        }
    }

    /// Count one applied report.
    pub fn record_accepted(&self) {
        self.reports_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one rejected report.
    pub fn record_rejected(&self) {
        self.reports_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count beacons removed by one sweep.
    pub fn record_evicted(&self, removed: usize) {
        let removed = u64::try_from(removed).unwrap_or(u64::MAX);
        self.beacons_evicted.fetch_add(removed, Ordering::Relaxed);
    }

    /// Count one published snapshot.
    pub fn record_published(&self) {
        self.snapshots_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters.
    pub fn snapshot(&self, now: DateTime<Utc>) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            uptime_seconds: now.signed_duration_since(self.started_at).num_seconds().max(0),
            reports_accepted: self.reports_accepted.load(Ordering::Relaxed),
            reports_rejected: self.reports_rejected.load(Ordering::Relaxed),
            beacons_evicted: self.beacons_evicted.load(Ordering::Relaxed),
            snapshots_published: self.snapshots_published.load(Ordering::Relaxed),
        }
    }
}

impl Default for TrackerStats {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn counters_accumulate() {
        let start = Utc::now();
        let stats = TrackerStats::new(start);
        stats.record_accepted();
        stats.record_accepted();
        stats.record_rejected();
        stats.record_evicted(3);
        stats.record_published();

        let snap = stats.snapshot(start + TimeDelta::seconds(42));
        assert_eq!(snap.reports_accepted, 2);
        assert_eq!(snap.reports_rejected, 1);
        assert_eq!(snap.beacons_evicted, 3);
        assert_eq!(snap.snapshots_published, 1);
        assert_eq!(snap.uptime_seconds, 42);
    }

    #[test]
    fn uptime_never_negative() {
        let start = Utc::now();
        let stats = TrackerStats::new(start);
        let snap = stats.snapshot(start - TimeDelta::seconds(5));
        assert_eq!(snap.uptime_seconds, 0);
    }
}
