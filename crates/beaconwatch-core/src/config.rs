//! Configuration loading and typed config structures for the tracker.
//!
//! The configuration lives in `beaconwatch.yaml`. Every field has a
//! default matching the reference deployment, so an empty or missing
//! file yields a working tracker. Values are fixed at startup.

use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

use beaconwatch_types::Position;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable tracker.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration.
///
/// Mirrors the structure of `beaconwatch.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackerConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Sweep cadence and staleness threshold.
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Position estimation constants.
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `BEACONWATCH_HOST` overrides `server.host`
    /// - `BEACONWATCH_PORT` overrides `server.port`
    /// - `BEACONWATCH_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values fail validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// No environment overrides or validation are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides looked up by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a port override is not a
    /// valid `u16`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BEACONWATCH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BEACONWATCH_PORT") {
            self.server.port = port.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("BEACONWATCH_PORT {port:?}: {e}"),
            })?;
        }
        if let Some(level) = lookup("BEACONWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracking.validate()?;
        self.estimator.validate()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Sweep cadence and staleness threshold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingConfig {
    /// Milliseconds between eviction sweeps.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Milliseconds without a report before a beacon is evicted.
    #[serde(default = "default_max_inactive_ms")]
    pub max_inactive_ms: u64,

    /// Snapshots buffered per viewer before a slow viewer skips ahead.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl TrackingConfig {
    /// Sweep cadence as a [`Duration`].
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Staleness threshold as a [`TimeDelta`].
    ///
    /// Values beyond `i64::MAX` milliseconds saturate.
    pub fn max_inactive(&self) -> TimeDelta {
        let millis = i64::try_from(self.max_inactive_ms).unwrap_or(i64::MAX);
        TimeDelta::try_milliseconds(millis).unwrap_or(TimeDelta::MAX)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_ms == 0 {
            return Err(invalid("tracking.sweep_interval_ms must be at least 1"));
        }
        if self.max_inactive_ms == 0 {
            return Err(invalid("tracking.max_inactive_ms must be at least 1"));
        }
        if self.broadcast_capacity == 0 {
            return Err(invalid("tracking.broadcast_capacity must be at least 1"));
        }
        Ok(())
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval_ms(),
            max_inactive_ms: default_max_inactive_ms(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Constants for turning RSSI readings into canvas positions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EstimatorConfig {
    /// Horizontal coordinate every bearing radiates from.
    #[serde(default = "default_center_x")]
    pub center_x: f64,

    /// Vertical coordinate every bearing radiates from.
    #[serde(default = "default_center_y")]
    pub center_y: f64,

    /// Pseudo-distance assigned to the strongest clamped reading.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,

    /// Weakest RSSI considered; lower readings clamp to it.
    #[serde(default = "default_rssi_floor")]
    pub rssi_floor: i32,

    /// Strongest RSSI considered; higher readings clamp to it.
    #[serde(default = "default_rssi_ceiling")]
    pub rssi_ceiling: i32,

    /// Weight of the previous position when smoothing (0 disables).
    #[serde(default = "default_prior_weight")]
    pub prior_weight: f64,

    /// Rectangle every estimate is clamped into.
    #[serde(default)]
    pub viewport: Viewport,
}

impl EstimatorConfig {
    /// The point bearings radiate from.
    pub const fn center(&self) -> Position {
        Position::new(self.center_x, self.center_y)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rssi_floor >= self.rssi_ceiling {
            return Err(invalid("estimator.rssi_floor must be below rssi_ceiling"));
        }
        if !(0.0..=1.0).contains(&self.prior_weight) {
            return Err(invalid("estimator.prior_weight must be within [0, 1]"));
        }
        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return Err(invalid("estimator.max_distance must be positive"));
        }
        self.viewport.validate()?;
        if !self.viewport.contains(self.center()) {
            return Err(invalid("estimator center must lie inside the viewport"));
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            center_x: default_center_x(),
            center_y: default_center_y(),
            max_distance: default_max_distance(),
            rssi_floor: default_rssi_floor(),
            rssi_ceiling: default_rssi_ceiling(),
            prior_weight: default_prior_weight(),
            viewport: Viewport::default(),
        }
    }
}

/// Axis-aligned rectangle positions are confined to.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Viewport {
    /// Smallest allowed x.
    #[serde(default = "default_min_x")]
    pub min_x: f64,
    /// Largest allowed x.
    #[serde(default = "default_max_x")]
    pub max_x: f64,
    /// Smallest allowed y.
    #[serde(default = "default_min_y")]
    pub min_y: f64,
    /// Largest allowed y.
    #[serde(default = "default_max_y")]
    pub max_y: f64,
}

impl Viewport {
    /// Clamp a position into the rectangle.
    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.clamp(self.min_x, self.max_x),
            position.y.clamp(self.min_y, self.max_y),
        )
    }

    /// Whether a position lies inside the rectangle, edges included.
    pub fn contains(&self, position: Position) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_y..=self.max_y).contains(&position.y)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(invalid("estimator.viewport bounds are inverted or not finite"));
        }
        Ok(())
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            min_x: default_min_x(),
            max_x: default_max_x(),
            min_y: default_min_y(),
            max_y: default_max_y(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter
    /// directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3001
}

const fn default_sweep_interval_ms() -> u64 {
    10_000
}

const fn default_max_inactive_ms() -> u64 {
    15_000
}

const fn default_broadcast_capacity() -> usize {
    64
}

const fn default_center_x() -> f64 {
    600.0
}

const fn default_center_y() -> f64 {
    400.0
}

const fn default_max_distance() -> f64 {
    300.0
}

const fn default_rssi_floor() -> i32 {
    -90
}

const fn default_rssi_ceiling() -> i32 {
    -30
}

const fn default_prior_weight() -> f64 {
    0.7
}

const fn default_min_x() -> f64 {
    50.0
}

const fn default_max_x() -> f64 {
    1150.0
}

const fn default_min_y() -> f64 {
    50.0
}

const fn default_max_y() -> f64 {
    750.0
}

fn default_log_level() -> String {
    "info".to_owned()
}
