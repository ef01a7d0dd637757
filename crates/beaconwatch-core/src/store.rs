//! The authoritative in-memory table of observed beacons.
//!
//! [`BeaconStore`] is the only component that mutates beacon records.
//! Every operation takes one [`Mutex`] around the table, and the lock is
//! held only for map work: no I/O, no awaiting other tasks. Snapshots are
//! owned copies, so callers never observe a concurrent mutation and can
//! broadcast after the lock is released.
//!
//! Records are keyed by [`BeaconId`] in a [`BTreeMap`], which gives
//! snapshots a stable order across calls.
//!
//! Every change bumps the store version under the same lock. A
//! [`VersionedSnapshot`] carries the version it was taken at, so
//! publishers can tell a newer state from an older one even when the
//! snapshots reach them out of order.

use std::collections::BTreeMap;

use beaconwatch_types::{BeaconId, BeaconRecord, BeaconReport};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::estimator::PositionEstimator;

/// A full copy of the store tagged with the version it reflects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionedSnapshot {
    /// Store version at the time of the copy. Higher is newer.
    pub version: u64,
    /// Every record, ordered by id.
    pub records: Vec<BeaconRecord>,
}

#[derive(Debug, Default)]
struct Table {
    beacons: BTreeMap<BeaconId, BeaconRecord>,
    version: u64,
}

impl Table {
    fn bump(&mut self) {
        self.version = self.version.saturating_add(1);
    }
}

/// Live set of beacons with their estimated positions.
#[derive(Debug)]
pub struct BeaconStore {
    estimator: PositionEstimator,
    table: Mutex<Table>,
}

impl BeaconStore {
    /// Create an empty store that positions beacons with `estimator`.
    pub fn new(estimator: PositionEstimator) -> Self {
        Self {
            estimator,
            table: Mutex::new(Table::default()),
        }
    }

    /// Apply one validated report and return the resulting record.
    ///
    /// A new id creates a record with `update_count == 1` and
    /// `first_seen == last_update == now`. A known id is re-estimated with
    /// its current position as prior; the label is replaced only by a
    /// non-empty one, and `last_update` never moves backwards.
    pub async fn upsert(&self, report: &BeaconReport, now: DateTime<Utc>) -> BeaconRecord {
        let mut table = self.table.lock().await;
        table.bump();

        if let Some(record) = table.beacons.get_mut(&report.id) {
            record.position =
                self.estimator
                    .estimate(report.signal_strength, &report.id, Some(record.position));
            record.signal_strength = report.signal_strength;
            if let Some(label) = &report.label {
                record.label = Some(label.clone());
            }
            record.last_update = record.last_update.max(now);
            record.update_count = record.update_count.saturating_add(1);

            debug!(
                id = %record.id,
                rssi = record.signal_strength,
                x = record.position.x,
                y = record.position.y,
                updates = record.update_count,
                "Beacon updated"
            );
            return record.clone();
        }

        let record = BeaconRecord {
            id: report.id.clone(),
            label: report.label.clone(),
            signal_strength: report.signal_strength,
            position: self
                .estimator
                .estimate(report.signal_strength, &report.id, None),
            last_update: now,
            update_count: 1,
            first_seen: now,
        };

        info!(
            id = %record.id,
            rssi = record.signal_strength,
            x = record.position.x,
            y = record.position.y,
            "New beacon"
        );
        table.beacons.insert(record.id.clone(), record.clone());
        record
    }

    /// Owned copy of every record, ordered by id.
    pub async fn snapshot(&self) -> Vec<BeaconRecord> {
        self.table.lock().await.beacons.values().cloned().collect()
    }

    /// Owned copy of every record together with the current version.
    pub async fn versioned_snapshot(&self) -> VersionedSnapshot {
        let table = self.table.lock().await;
        VersionedSnapshot {
            version: table.version,
            records: table.beacons.values().cloned().collect(),
        }
    }

    /// Current store version. Zero until the first change.
    pub async fn version(&self) -> u64 {
        self.table.lock().await.version
    }

    /// Remove every record with `now - last_update >= max_inactive`.
    ///
    /// Returns the number of records removed; zero means nothing changed
    /// and the version stays put.
    pub async fn prune(&self, now: DateTime<Utc>, max_inactive: TimeDelta) -> usize {
        let mut table = self.table.lock().await;
        let before = table.beacons.len();
        table
            .beacons
            .retain(|_, record| now.signed_duration_since(record.last_update) < max_inactive);
        let removed = before.saturating_sub(table.beacons.len());
        if removed > 0 {
            table.bump();
        }
        removed
    }

    /// Current record for one beacon, if it is being tracked.
    pub async fn get(&self, id: &BeaconId) -> Option<BeaconRecord> {
        self.table.lock().await.beacons.get(id).cloned()
    }

    /// Number of tracked beacons.
    pub async fn len(&self) -> usize {
        self.table.lock().await.beacons.len()
    }

    /// Whether no beacons are tracked.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.beacons.is_empty()
    }

    /// The estimator used for new readings.
    pub const fn estimator(&self) -> &PositionEstimator {
        &self.estimator
    }
}

impl Default for BeaconStore {
    fn default() -> Self {
        Self::new(PositionEstimator::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use beaconwatch_types::IngestRequest;
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn report(id: &str, label: &str, rssi: i64) -> BeaconReport {
        let label = (!label.is_empty()).then(|| label.to_owned());
        IngestRequest::new(id, label, rssi).validate().unwrap()
    }

    #[tokio::test]
    async fn first_upsert_creates_record() {
        let store = BeaconStore::default();
        let record = store.upsert(&report("AA:01", "T1", -40), at(0)).await;

        assert_eq!(record.update_count, 1);
        assert_eq!(record.first_seen, at(0));
        assert_eq!(record.last_update, at(0));
        assert_eq!(record.label.as_deref(), Some("T1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn second_upsert_updates_in_place() {
        let store = BeaconStore::default();
        let first = store.upsert(&report("AA:01", "T1", -40), at(0)).await;
        let second = store.upsert(&report("aa:01", "", -80), at(5)).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(second.update_count, 2);
        assert_eq!(second.first_seen, first.first_seen);
        assert_eq!(second.last_update, at(5));
        assert_eq!(second.signal_strength, -80);
        assert_eq!(second.label.as_deref(), Some("T1"));

        let expected = store
            .estimator()
            .estimate(-80, &second.id, Some(first.position));
        assert!(second.position.distance_to(expected) < 1e-9);
    }

    #[tokio::test]
    async fn non_empty_label_replaces_previous() {
        let store = BeaconStore::default();
        store.upsert(&report("AA:01", "T1", -40), at(0)).await;
        let record = store.upsert(&report("AA:01", "Forklift", -40), at(1)).await;
        assert_eq!(record.label.as_deref(), Some("Forklift"));
    }

    #[tokio::test]
    async fn last_update_never_moves_backwards() {
        let store = BeaconStore::default();
        store.upsert(&report("AA:01", "", -40), at(10)).await;
        let record = store.upsert(&report("AA:01", "", -45), at(4)).await;
        assert_eq!(record.last_update, at(10));
        assert_eq!(record.update_count, 2);
    }

    #[tokio::test]
    async fn snapshot_is_a_detached_copy() {
        let store = BeaconStore::default();
        store.upsert(&report("AA:02", "", -40), at(0)).await;
        store.upsert(&report("AA:01", "", -40), at(0)).await;

        let snapshot = store.snapshot().await;
        store.upsert(&report("AA:03", "", -40), at(1)).await;

        assert_eq!(snapshot.len(), 2);
        let ids: Vec<_> = snapshot.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["AA:01", "AA:02"]);
        assert_eq!(store.snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn prune_removes_exactly_the_stale_records() {
        let store = BeaconStore::default();
        store.upsert(&report("AA:01", "old", -40), at(0)).await;
        store.upsert(&report("AA:02", "edge", -50), at(5)).await;
        let fresh = store.upsert(&report("AA:03", "fresh", -60), at(12)).await;

        // At t=20: AA:01 is 20s old, AA:02 exactly 15s, AA:03 8s.
        let removed = store.prune(at(20), TimeDelta::seconds(15)).await;
        assert_eq!(removed, 2);

        let remaining = store.snapshot().await;
        assert_eq!(remaining, vec![fresh]);
    }

    #[tokio::test]
    async fn prune_with_nothing_stale_is_a_no_op() {
        let store = BeaconStore::default();
        store.upsert(&report("AA:01", "", -40), at(0)).await;
        assert_eq!(store.prune(at(3), TimeDelta::seconds(15)).await, 0);
        assert_eq!(store.len().await, 1);

        let empty = BeaconStore::default();
        assert_eq!(empty.prune(at(3), TimeDelta::seconds(15)).await, 0);
        assert!(empty.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_reports_for_one_id_serialize() {
        let store = Arc::new(BeaconStore::default());
        let mut handles = Vec::new();
        for i in 0..50_i64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.upsert(&report("AA:01", "", -40 - i), at(i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = store.get(&BeaconId::parse("AA:01").unwrap()).await.unwrap();
        assert_eq!(record.update_count, 50);
        assert_eq!(store.len().await, 1);
        assert_eq!(record.last_update, at(49));
    }

    #[tokio::test]
    async fn version_moves_only_on_change() {
        let store = BeaconStore::default();
        assert_eq!(store.version().await, 0);

        store.upsert(&report("AA:01", "", -40), at(0)).await;
        store.upsert(&report("AA:01", "", -41), at(1)).await;
        assert_eq!(store.version().await, 2);

        assert_eq!(store.prune(at(2), TimeDelta::seconds(15)).await, 0);
        assert_eq!(store.version().await, 2);

        assert_eq!(store.prune(at(30), TimeDelta::seconds(15)).await, 1);
        let snapshot = store.versioned_snapshot().await;
        assert_eq!(snapshot.version, 3);
        assert!(snapshot.records.is_empty());
    }
}
