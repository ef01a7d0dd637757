//! Shared type definitions for the Beaconwatch proximity tracker.
//!
//! This crate is the single source of truth for the records that flow
//! between scanners, the tracking core, and viewers. Types flow
//! downstream to `TypeScript` via `ts-rs` for the viewer frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Beacon hardware identifiers and viewer connection ids
//! - [`beacon`] -- Beacon records and canvas positions
//! - [`report`] -- Inbound reports and their validation
//! - [`signal`] -- Signal quality buckets for display

pub mod beacon;
pub mod ids;
pub mod report;
pub mod signal;

// Re-export all public types at crate root for convenience.
pub use beacon::{BeaconRecord, Position};
pub use ids::{BeaconId, BeaconIdError, ViewerId};
pub use report::{BeaconReport, IngestRequest, ValidationError};
pub use signal::SignalQuality;
