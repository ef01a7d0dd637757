//! Configuration for the scanner bridge.
//!
//! All configuration is loaded from environment variables. The bridge
//! needs to know where the tracker lives and where its reports come
//! from: a scanner's line output, or the built-in simulator.

use std::str::FromStr;
use std::time::Duration;

use crate::error::BridgeError;

/// Complete bridge configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Base URL of the tracker (e.g. `http://localhost:3001`).
    pub server_url: String,
    /// Where reports come from.
    pub mode: BridgeMode,
    /// Device path or file to read in serial mode; `-` means stdin.
    pub source: String,
    /// Simulator settings, used in simulate mode.
    pub simulation: SimulationConfig,
}

/// Report source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMode {
    /// Relay `name,mac,rssi` lines from a scanner.
    Serial,
    /// Generate synthetic beacons.
    Simulate,
}

impl FromStr for BridgeMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serial" | "stdin" | "file" => Ok(Self::Serial),
            "simulate" | "sim" => Ok(Self::Simulate),
            other => Err(BridgeError::Config(format!("unknown bridge mode: {other}"))),
        }
    }
}

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of synthetic beacons.
    pub beacons: u16,
    /// Time between report rounds.
    pub interval: Duration,
    /// RNG seed; equal seeds give equal report sequences.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            beacons: 5,
            interval: Duration::from_millis(1000),
            seed: 42,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `BEACONWATCH_URL` -- tracker base URL (default `http://localhost:3001`)
    /// - `BRIDGE_MODE` -- `serial` or `simulate` (default `serial`)
    /// - `BRIDGE_SOURCE` -- device path or file, `-` for stdin (default `-`)
    /// - `BRIDGE_SIM_BEACONS` -- simulated beacon count (default 5)
    /// - `BRIDGE_SIM_INTERVAL_MS` -- simulated report interval (default 1000)
    /// - `BRIDGE_SIM_SEED` -- simulator seed (default 42)
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if a variable does not parse.
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if a variable does not parse or
    /// the simulator settings are unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("BEACONWATCH_URL")
            .unwrap_or_else(|| "http://localhost:3001".to_owned());
        let mode = lookup("BRIDGE_MODE").map_or(Ok(BridgeMode::Serial), |m| m.parse())?;
        let source = lookup("BRIDGE_SOURCE").unwrap_or_else(|| "-".to_owned());

        let defaults = SimulationConfig::default();
        let beacons: u16 = parsed(&lookup, "BRIDGE_SIM_BEACONS", defaults.beacons)?;
        let interval_ms: u64 = parsed(&lookup, "BRIDGE_SIM_INTERVAL_MS", 1000)?;
        let seed: u64 = parsed(&lookup, "BRIDGE_SIM_SEED", defaults.seed)?;

        if beacons == 0 {
            return Err(BridgeError::Config(
                "BRIDGE_SIM_BEACONS must be at least 1".to_owned(),
            ));
        }
        if interval_ms == 0 {
            return Err(BridgeError::Config(
                "BRIDGE_SIM_INTERVAL_MS must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            server_url,
            mode,
            source,
            simulation: SimulationConfig {
                beacons,
                interval: Duration::from_millis(interval_ms),
                seed,
            },
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parsed<T, F>(lookup: &F, name: &str, default: T) -> Result<T, BridgeError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| BridgeError::Config(format!("invalid {name}: {e}")))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = BridgeConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server_url, "http://localhost:3001");
        assert_eq!(config.mode, BridgeMode::Serial);
        assert_eq!(config.source, "-");
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn simulate_mode_from_env() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            ("BEACONWATCH_URL", "http://tracker:9000"),
            ("BRIDGE_MODE", "Simulate"),
            ("BRIDGE_SIM_BEACONS", "12"),
            ("BRIDGE_SIM_INTERVAL_MS", "250"),
            ("BRIDGE_SIM_SEED", "7"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "http://tracker:9000");
        assert_eq!(config.mode, BridgeMode::Simulate);
        assert_eq!(config.simulation.beacons, 12);
        assert_eq!(config.simulation.interval, Duration::from_millis(250));
        assert_eq!(config.simulation.seed, 7);
    }

    #[test]
    fn bad_values_are_config_errors() {
        for pairs in [
            [("BRIDGE_MODE", "bluetooth")],
            [("BRIDGE_SIM_BEACONS", "many")],
            [("BRIDGE_SIM_BEACONS", "0")],
            [("BRIDGE_SIM_INTERVAL_MS", "0")],
        ] {
            let result = BridgeConfig::from_lookup(lookup_from(&pairs));
            assert!(matches!(result, Err(BridgeError::Config(_))), "{pairs:?}");
        }
    }
}
