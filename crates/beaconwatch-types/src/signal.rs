//! Coarse signal quality buckets for display.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Qualitative reading of an RSSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SignalQuality {
    /// -50 dBm or stronger.
    Excellent,
    /// -60 dBm up to -50 dBm.
    Good,
    /// -70 dBm up to -60 dBm.
    Fair,
    /// Weaker than -70 dBm.
    Weak,
}

impl SignalQuality {
    /// Bucket a raw RSSI reading.
    pub const fn from_rssi(rssi: i32) -> Self {
        if rssi >= -50 {
            Self::Excellent
        } else if rssi >= -60 {
            Self::Good
        } else if rssi >= -70 {
            Self::Fair
        } else {
            Self::Weak
        }
    }

    /// Lower-case display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Weak => "weak",
        }
    }
}
