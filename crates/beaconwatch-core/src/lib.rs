//! Position estimation, beacon store, and eviction sweep for Beaconwatch.
//!
//! This crate owns the live set of observed beacons. Reports flow in
//! through the [`Ingestor`], are positioned by the [`PositionEstimator`],
//! and land in the [`BeaconStore`]. The [`EvictionSweeper`] removes
//! beacons that stop reporting. Both hand full snapshots to a
//! [`SnapshotPublisher`] for fan-out to viewers.
//!
//! # Modules
//!
//! - [`clock`] -- Wall-clock source, swappable for simulated time.
//! - [`config`] -- Configuration loading from `beaconwatch.yaml` into
//!   strongly-typed structs.
//! - [`estimator`] -- RSSI to canvas position mapping with smoothing.
//! - [`ingest`] -- Report validation, upsert, and publish.
//! - [`publish`] -- [`SnapshotPublisher`] trait and simple publishers.
//! - [`stats`] -- Atomic counters for the status endpoint.
//! - [`store`] -- The locked beacon table.
//! - [`sweeper`] -- Periodic eviction of stale beacons.
//!
//! [`Ingestor`]: ingest::Ingestor
//! [`PositionEstimator`]: estimator::PositionEstimator
//! [`BeaconStore`]: store::BeaconStore
//! [`EvictionSweeper`]: sweeper::EvictionSweeper
//! [`SnapshotPublisher`]: publish::SnapshotPublisher

pub mod clock;
pub mod config;
pub mod estimator;
pub mod ingest;
pub mod publish;
pub mod stats;
pub mod store;
pub mod sweeper;
