//! Scanner line parsing.
//!
//! The scanner firmware prints one sighting per line as
//! `name,mac,rssi`. Anything else on the line (boot banners, blank
//! lines, debug output) is skipped.

use std::num::ParseIntError;

use beaconwatch_types::IngestRequest;

/// One parsed scanner sighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLine {
    /// Advertised device name; may be empty.
    pub name: String,
    /// Hardware address as printed by the scanner.
    pub mac: String,
    /// Received signal strength.
    pub rssi: i64,
}

impl ScanLine {
    /// Convert the sighting into an ingest report.
    pub fn into_request(self) -> IngestRequest {
        IngestRequest::new(self.mac, Some(self.name), self.rssi)
    }
}

/// Why a scanner line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// Nothing but whitespace.
    #[error("blank line")]
    Blank,

    /// The line does not have exactly two commas.
    #[error("expected 2 commas, found {0}")]
    FieldCount(usize),

    /// The MAC field is empty.
    #[error("missing mac")]
    MissingMac,

    /// The RSSI field is not an integer.
    #[error("invalid rssi {value:?}: {source}")]
    Rssi {
        /// The offending field.
        value: String,
        /// The integer parse failure.
        #[source]
        source: ParseIntError,
    },
}

/// Parse one `name,mac,rssi` line.
///
/// # Errors
///
/// Returns [`LineError`] describing why the line is not a sighting.
pub fn parse_scan_line(line: &str) -> Result<ScanLine, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LineError::Blank);
    }

    let commas = line.matches(',').count();
    if commas != 2 {
        return Err(LineError::FieldCount(commas));
    }

    let mut fields = line.splitn(3, ',').map(str::trim);
    let (Some(name), Some(mac), Some(rssi)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(LineError::FieldCount(commas));
    };

    if mac.is_empty() {
        return Err(LineError::MissingMac);
    }

    let rssi = rssi.parse().map_err(|source| LineError::Rssi {
        value: rssi.to_owned(),
        source,
    })?;

    Ok(ScanLine {
        name: name.to_owned(),
        mac: mac.to_owned(),
        rssi,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_sighting() {
        let line = parse_scan_line("Tag-07,AC:23:3F:A1:02:7B,-67\r\n").unwrap();
        assert_eq!(
            line,
            ScanLine {
                name: "Tag-07".to_owned(),
                mac: "AC:23:3F:A1:02:7B".to_owned(),
                rssi: -67,
            }
        );
    }

    #[test]
    fn empty_name_is_allowed() {
        let line = parse_scan_line(",AC:23:3F:A1:02:7B,-80").unwrap();
        assert!(line.name.is_empty());

        let request = line.into_request();
        assert_eq!(request.id.as_deref(), Some("AC:23:3F:A1:02:7B"));
        assert_eq!(request.signal_strength, Some(-80));
        // A blank name validates to no label.
        assert_eq!(request.validate().unwrap().label, None);
    }

    #[test]
    fn wrong_comma_count_is_skipped() {
        assert_eq!(parse_scan_line("Scanning..."), Err(LineError::FieldCount(0)));
        assert_eq!(
            parse_scan_line("a,b,c,-40"),
            Err(LineError::FieldCount(3))
        );
        assert_eq!(parse_scan_line("   "), Err(LineError::Blank));
    }

    #[test]
    fn bad_rssi_or_mac_is_skipped() {
        assert!(matches!(
            parse_scan_line("Tag,AC:23:3F:A1:02:7B,loud"),
            Err(LineError::Rssi { .. })
        ));
        assert_eq!(parse_scan_line("Tag, ,-40"), Err(LineError::MissingMac));
    }
}
