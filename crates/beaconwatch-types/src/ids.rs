//! Identifier types for beacons and viewer connections.
//!
//! [`BeaconId`] wraps the hardware identifier a scanner reports for a
//! beacon (colon-separated hex octets such as `AA:BB:CC:DD:EE:01`). It is
//! validated and normalized once at the edge so every downstream consumer
//! can rely on the octets parsing cleanly.
//!
//! [`ViewerId`] tags each connected viewer for log correlation. It uses
//! UUID v7 so ids sort by connection time.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Maximum number of hex digits in a single octet.
const MAX_OCTET_DIGITS: usize = 2;

/// Errors produced when parsing a [`BeaconId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BeaconIdError {
    /// The identifier was empty or whitespace only.
    #[error("beacon id is empty")]
    Empty,

    /// One of the colon-separated segments is not a 1-2 digit hex octet.
    #[error("octet {index} ({octet:?}) is not a hex octet")]
    InvalidOctet {
        /// Zero-based position of the offending segment.
        index: usize,
        /// The segment as received.
        octet: String,
    },
}

/// Stable hardware identifier of a beacon.
///
/// Stored trimmed and upper-cased, so `aa:bb:cc:dd:ee:01` and
/// `AA:BB:CC:DD:EE:01` name the same beacon.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export, export_to = "bindings/")]
pub struct BeaconId(String);

impl BeaconId {
    /// Parse and normalize a raw hardware identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BeaconIdError::Empty`] for blank input and
    /// [`BeaconIdError::InvalidOctet`] when a segment is empty, longer
    /// than two characters, or contains a non-hex character.
    pub fn parse(raw: &str) -> Result<Self, BeaconIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BeaconIdError::Empty);
        }

        for (index, octet) in trimmed.split(':').enumerate() {
            let valid = !octet.is_empty()
                && octet.len() <= MAX_OCTET_DIGITS
                && octet.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                return Err(BeaconIdError::InvalidOctet {
                    index,
                    octet: octet.to_owned(),
                });
            }
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The normalized identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of each octet, in order.
    pub fn octets(&self) -> impl Iterator<Item = u8> + '_ {
        self.0
            .split(':')
            .filter_map(|octet| u8::from_str_radix(octet, 16).ok())
    }

    /// Sum of all octet values.
    ///
    /// Used to derive a fixed bearing per beacon; viewers use the same
    /// sum to pick a stable marker color.
    pub fn octet_sum(&self) -> u32 {
        self.octets().map(u32::from).fold(0, u32::saturating_add)
    }
}

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BeaconId {
    type Err = BeaconIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BeaconId {
    type Error = BeaconIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BeaconId> for String {
    fn from(id: BeaconId) -> Self {
        id.0
    }
}

impl AsRef<str> for BeaconId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a connected viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ViewerId(pub Uuid);

impl ViewerId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ViewerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let id = BeaconId::parse("  aa:bb:cc:dd:ee:01 ").unwrap();
        assert_eq!(id.as_str(), "AA:BB:CC:DD:EE:01");
        assert_eq!(id, BeaconId::parse("AA:BB:CC:DD:EE:01").unwrap());
    }

    #[test]
    fn parse_accepts_single_digit_octets() {
        let id = BeaconId::parse("a:0:f").unwrap();
        assert_eq!(id.octets().collect::<Vec<_>>(), vec![10, 0, 15]);
    }

    #[test]
    fn parse_rejects_blank() {
        assert_eq!(BeaconId::parse("   "), Err(BeaconIdError::Empty));
    }

    #[test]
    fn parse_rejects_bad_octets() {
        let err = BeaconId::parse("AA:BB:GG").unwrap_err();
        assert_eq!(
            err,
            BeaconIdError::InvalidOctet {
                index: 2,
                octet: "GG".to_owned()
            }
        );
        assert!(BeaconId::parse("AA::BB").is_err());
        assert!(BeaconId::parse("AAB:01").is_err());
        assert!(BeaconId::parse("AA:BB:").is_err());
    }

    #[test]
    fn octet_sum_adds_every_octet() {
        let id = BeaconId::parse("AA:BB:CC:DD:EE:01").unwrap();
        // 170 + 187 + 204 + 221 + 238 + 1
        assert_eq!(id.octet_sum(), 1021);
    }

    #[test]
    fn serde_round_trip_validates() {
        let id: BeaconId = serde_json::from_str("\"de:ad:be:ef\"").unwrap();
        assert_eq!(id.as_str(), "DE:AD:BE:EF");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"DE:AD:BE:EF\"");
        assert!(serde_json::from_str::<BeaconId>("\"not-a-mac\"").is_err());
    }

    #[test]
    fn viewer_ids_are_unique() {
        assert_ne!(ViewerId::new(), ViewerId::new());
    }
}
