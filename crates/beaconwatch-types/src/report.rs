//! Inbound beacon reports and their validation.
//!
//! [`IngestRequest`] is the permissive wire form: every field is
//! optional so a missing field surfaces as a [`ValidationError`] with a
//! readable message instead of a generic deserialization failure.
//! [`IngestRequest::validate`] turns it into a [`BeaconReport`], the only
//! form the store accepts.
//!
//! The field aliases (`mac`, `nome`, `name`, `rssi`) keep older scanner
//! scripts working unchanged.

use core::num::TryFromIntError;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{BeaconId, BeaconIdError};

/// A beacon report as received from a scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct IngestRequest {
    /// Hardware identifier of the beacon.
    #[serde(default, alias = "mac")]
    pub id: Option<String>,
    /// Optional human-readable name.
    #[serde(default, alias = "nome", alias = "name", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Raw RSSI reading.
    #[serde(default, alias = "rssi")]
    pub signal_strength: Option<i64>,
}

impl IngestRequest {
    /// Build a request from already-known parts.
    pub fn new(id: impl Into<String>, label: Option<String>, signal_strength: i64) -> Self {
        Self {
            id: Some(id.into()),
            label,
            signal_strength: Some(signal_strength),
        }
    }

    /// Check required fields and normalize the report.
    ///
    /// Labels are trimmed; a blank label becomes `None` so it never
    /// overwrites a previously reported name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `id` or `signalStrength` is
    /// missing, the id is not colon-separated hex octets, or the signal
    /// strength does not fit in an `i32`.
    pub fn validate(self) -> Result<BeaconReport, ValidationError> {
        let raw_id = self.id.ok_or(ValidationError::MissingField("id"))?;
        let id = BeaconId::parse(&raw_id)?;

        let raw_signal = self
            .signal_strength
            .ok_or(ValidationError::MissingField("signalStrength"))?;
        let signal_strength = i32::try_from(raw_signal).map_err(|source| {
            ValidationError::SignalOutOfRange {
                value: raw_signal,
                source,
            }
        })?;

        let label = self
            .label
            .map(|label| label.trim().to_owned())
            .filter(|label| !label.is_empty());

        Ok(BeaconReport {
            id,
            label,
            signal_strength,
        })
    }
}

/// A validated beacon report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconReport {
    /// Normalized hardware identifier.
    pub id: BeaconId,
    /// Non-blank label, if one was supplied.
    pub label: Option<String>,
    /// Raw RSSI reading.
    pub signal_strength: i32,
}

/// Reasons an inbound report is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was absent or null.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The beacon id is malformed.
    #[error("invalid beacon id: {0}")]
    InvalidId(#[from] BeaconIdError),

    /// The signal strength cannot be represented.
    #[error("signalStrength {value} is out of range")]
    SignalOutOfRange {
        /// The value as received.
        value: i64,
        /// The failed conversion.
        #[source]
        source: TryFromIntError,
    },

    /// The body could not be read as a report at all.
    #[error("malformed report: {0}")]
    Malformed(String),
}
