//! Beacon records as held by the store and pushed to viewers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::BeaconId;
use crate::signal::SignalQuality;

/// A point on the viewer canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The live state of one observed beacon.
///
/// Serialized in camelCase with the position flattened, so viewers see
/// `{id, label, signalStrength, x, y, lastUpdate, updateCount, firstSeen}`.
/// Timestamps travel as milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BeaconRecord {
    /// Hardware identifier, unique within the store.
    pub id: BeaconId,
    /// Human-readable name; the last non-empty label reported.
    pub label: Option<String>,
    /// Most recent raw RSSI reading, stored as received.
    pub signal_strength: i32,
    /// Estimated position, always inside the viewport.
    #[serde(flatten)]
    pub position: Position,
    /// When the most recent report was applied.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub last_update: DateTime<Utc>,
    /// Number of reports applied to this record.
    pub update_count: u64,
    /// When the first report for this beacon arrived.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub first_seen: DateTime<Utc>,
}

impl BeaconRecord {
    /// Qualitative bucket for the latest signal reading.
    pub const fn quality(&self) -> SignalQuality {
        SignalQuality::from_rssi(self.signal_strength)
    }
}
