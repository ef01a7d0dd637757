//! Fan-out of beacon snapshots to connected viewers.
//!
//! The [`Broadcaster`] wraps a [`tokio::sync::broadcast`] channel. Each
//! viewer connection holds one receiver, so the channel itself is the
//! viewer registry: a viewer that disconnects drops its receiver and
//! silently leaves the set. Snapshots are encoded to JSON once per
//! publish and the same frame is shared by every viewer.
//!
//! Every message is a complete snapshot. A viewer that falls more than
//! the channel capacity behind skips straight to the newest one and is
//! still fully consistent.
//!
//! Ingest and the sweep publish concurrently, so snapshots can arrive
//! here out of order. Frames go out in strictly increasing store
//! version; a snapshot no newer than the last frame sent is dropped.

use std::sync::{Mutex, PoisonError};

use axum::extract::ws::Utf8Bytes;
use beaconwatch_core::publish::SnapshotPublisher;
use beaconwatch_core::store::VersionedSnapshot;
use beaconwatch_types::BeaconRecord;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Default number of snapshots buffered per viewer.
pub const DEFAULT_CAPACITY: usize = 64;

/// One encoded snapshot as delivered to viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFrame {
    /// Store version the snapshot reflects.
    pub version: u64,
    /// JSON array of beacon records.
    pub payload: Utf8Bytes,
}

/// Pushes full beacon snapshots to every subscribed viewer.
#[derive(Debug)]
pub struct Broadcaster {
    tx: broadcast::Sender<SnapshotFrame>,
    last_sent: Mutex<u64>,
}

impl Broadcaster {
    /// Create a broadcaster buffering up to `capacity` frames per viewer.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            last_sent: Mutex::new(0),
        }
    }

    /// Register a new viewer.
    ///
    /// The receiver yields every frame published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotFrame> {
        self.tx.subscribe()
    }

    /// Number of currently connected viewers.
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Version of the newest frame sent so far.
    pub fn last_sent_version(&self) -> u64 {
        *self.last_sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SnapshotPublisher for Broadcaster {
    fn publish(&self, snapshot: &VersionedSnapshot) -> usize {
        let payload = match encode_snapshot(&snapshot.records) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize beacon snapshot");
                return 0;
            }
        };

        // Held across the send so frames leave in version order. The send
        // itself only enqueues.
        let mut last_sent = self.last_sent.lock().unwrap_or_else(PoisonError::into_inner);
        if snapshot.version <= *last_sent {
            debug!(
                version = snapshot.version,
                newest = *last_sent,
                "Superseded snapshot dropped"
            );
            return 0;
        }
        *last_sent = snapshot.version;

        // send only errs when nobody is connected, which is normal.
        let receivers = self
            .tx
            .send(SnapshotFrame {
                version: snapshot.version,
                payload,
            })
            .unwrap_or(0);
        trace!(
            version = snapshot.version,
            beacons = snapshot.records.len(),
            receivers,
            "Snapshot broadcast"
        );
        receivers
    }
}

/// Encode a snapshot as the JSON array viewers expect.
///
/// # Errors
///
/// Returns the serializer error if a record cannot be encoded.
pub fn encode_snapshot(snapshot: &[BeaconRecord]) -> Result<Utf8Bytes, serde_json::Error> {
    serde_json::to_string(snapshot).map(Utf8Bytes::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use beaconwatch_types::{BeaconId, Position};
    use chrono::Utc;

    use super::*;

    fn record(id: &str) -> BeaconRecord {
        let now = Utc::now();
        BeaconRecord {
            id: BeaconId::parse(id).unwrap(),
            label: None,
            signal_strength: -60,
            position: Position::new(600.0, 400.0),
            last_update: now,
            update_count: 1,
            first_seen: now,
        }
    }

    fn snapshot(version: u64, records: Vec<BeaconRecord>) -> VersionedSnapshot {
        VersionedSnapshot { version, records }
    }

    #[test]
    fn publish_without_viewers_is_not_an_error() {
        let broadcaster = Broadcaster::default();
        assert_eq!(broadcaster.publish(&snapshot(1, vec![record("AA:01")])), 0);
        assert_eq!(broadcaster.viewer_count(), 0);
        assert_eq!(broadcaster.last_sent_version(), 1);
    }

    #[tokio::test]
    async fn every_viewer_gets_the_same_frame() {
        let broadcaster = Broadcaster::new(4);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        assert_eq!(broadcaster.viewer_count(), 2);

        let published = snapshot(1, vec![record("AA:01"), record("AA:02")]);
        assert_eq!(broadcaster.publish(&published), 2);

        let frame_a = a.recv().await.unwrap();
        let frame_b = b.recv().await.unwrap();
        assert_eq!(frame_a, frame_b);
        assert_eq!(frame_a.version, 1);
        let json: serde_json::Value = serde_json::from_str(frame_a.payload.as_str()).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn dropped_viewer_leaves_the_set() {
        let broadcaster = Broadcaster::default();
        let gone = broadcaster.subscribe();
        let mut alive = broadcaster.subscribe();
        drop(gone);

        assert_eq!(broadcaster.viewer_count(), 1);
        assert_eq!(broadcaster.publish(&snapshot(1, Vec::new())), 1);
        assert_eq!(alive.recv().await.unwrap().payload.as_str(), "[]");
    }

    #[tokio::test]
    async fn lagging_viewer_skips_to_newest() {
        let broadcaster = Broadcaster::new(1);
        let mut rx = broadcaster.subscribe();
        broadcaster.publish(&snapshot(1, vec![record("AA:01")]));
        broadcaster.publish(&snapshot(2, Vec::new()));

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().payload.as_str(), "[]");
    }

    #[tokio::test]
    async fn older_snapshot_after_newer_is_dropped() {
        let broadcaster = Broadcaster::default();
        let mut rx = broadcaster.subscribe();

        assert_eq!(
            broadcaster.publish(&snapshot(5, vec![record("AA:01"), record("AA:02")])),
            1
        );
        assert_eq!(broadcaster.publish(&snapshot(4, vec![record("AA:01")])), 0);
        assert_eq!(broadcaster.publish(&snapshot(5, Vec::new())), 0);
        assert_eq!(broadcaster.last_sent_version(), 5);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.version, 5);
        assert!(rx.try_recv().is_err());

        assert_eq!(broadcaster.publish(&snapshot(6, Vec::new())), 1);
        assert_eq!(rx.recv().await.unwrap().version, 6);
    }
}
