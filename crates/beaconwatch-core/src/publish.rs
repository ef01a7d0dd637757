//! The seam between the tracking core and whatever delivers snapshots.
//!
//! The core never talks to viewers directly. Ingest and the eviction
//! sweep hand a full snapshot to a [`SnapshotPublisher`]; the observer
//! crate implements it with a broadcast channel.

use std::sync::Mutex;

use beaconwatch_types::BeaconRecord;

use crate::store::VersionedSnapshot;

/// Receives full beacon snapshots for fan-out.
///
/// `publish` must not block on network I/O: it is called from the sweep
/// timer and from request handlers. Delivery failures stay inside the
/// implementation.
///
/// Snapshots are taken under the store lock but published after it is
/// released, so concurrent callers may deliver them out of order.
/// Implementations that forward to viewers should drop a snapshot whose
/// version is not newer than the last one they forwarded.
pub trait SnapshotPublisher: Send + Sync {
    /// Hand a complete snapshot to every current subscriber.
    ///
    /// Returns the number of subscribers the snapshot was queued for.
    fn publish(&self, snapshot: &VersionedSnapshot) -> usize;
}

/// A publisher that drops every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPublisher;

impl SnapshotPublisher for NoOpPublisher {
    fn publish(&self, _snapshot: &VersionedSnapshot) -> usize {
        0
    }
}

/// A publisher that keeps every snapshot it is given.
///
/// Useful for tests and for embedding the core without a transport.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Vec<BeaconRecord>>>,
}

impl RecordingPublisher {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots published so far, oldest first.
    pub fn published(&self) -> Vec<Vec<BeaconRecord>> {
        self.published
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of snapshots published so far.
    pub fn count(&self) -> usize {
        self.published.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl SnapshotPublisher for RecordingPublisher {
    fn publish(&self, snapshot: &VersionedSnapshot) -> usize {
        if let Ok(mut guard) = self.published.lock() {
            guard.push(snapshot.records.clone());
        }
        1
    }
}
