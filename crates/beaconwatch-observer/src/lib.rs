//! Ingest API and viewer feed for the Beaconwatch tracker.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Ingest endpoint** (`POST /api/beacon`) accepting one signal
//!   report per request from scanners or the serial bridge
//! - **`WebSocket` endpoint** (`/ws/beacons`) pushing a full snapshot of
//!   every tracked beacon on connect and after every change, via
//!   [`tokio::sync::broadcast`]
//! - **REST endpoints** for reading the current snapshot and counters
//! - **Minimal HTML page** (`GET /`) listing live beacons
//!
//! # Architecture
//!
//! Handlers never touch the beacon table directly. Reports go through
//! the core [`Ingestor`], which updates the store and hands the new
//! snapshot to the [`Broadcaster`]. The eviction sweeper publishes
//! through the same broadcaster. Every snapshot carries the store
//! version it was taken at; the broadcaster and each viewer session
//! drop anything not newer than what they already sent, so viewers see
//! one stream of snapshots in version order from both sources.
//!
//! [`Ingestor`]: beaconwatch_core::ingest::Ingestor
//! [`Broadcaster`]: broadcast::Broadcaster

pub mod broadcast;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use broadcast::Broadcaster;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
