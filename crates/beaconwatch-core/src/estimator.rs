//! RSSI to canvas position estimation.
//!
//! Each beacon gets a fixed bearing from the canvas center, derived from
//! the sum of its id octets, so distinct beacons fan out instead of
//! stacking. Signal strength only moves a beacon along its bearing:
//! stronger readings sit further out. Consecutive readings are smoothed
//! against the previous position to damp RSSI jitter.
//!
//! The estimator holds configuration only. [`PositionEstimator::estimate`]
//! is pure: identical inputs always produce identical output.

use beaconwatch_types::{BeaconId, Position};

use crate::config::{EstimatorConfig, Viewport};

/// Degrees in a full turn; octet sums wrap at this value.
const FULL_TURN_DEGREES: u32 = 360;

/// Maps raw signal readings to positions inside the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEstimator {
    center: Position,
    max_distance: f64,
    rssi_floor: i32,
    rssi_ceiling: i32,
    prior_weight: f64,
    viewport: Viewport,
}

impl PositionEstimator {
    /// Build an estimator from validated configuration.
    pub const fn new(config: &EstimatorConfig) -> Self {
        Self {
            center: config.center(),
            max_distance: config.max_distance,
            rssi_floor: config.rssi_floor,
            rssi_ceiling: config.rssi_ceiling,
            prior_weight: config.prior_weight,
            viewport: config.viewport,
        }
    }

    /// Estimate a beacon's position.
    ///
    /// Without a prior the unsmoothed candidate is used. With one, the
    /// result is `prior_weight * prior + (1 - prior_weight) * candidate`
    /// on each axis. The result is always clamped into the viewport.
    pub fn estimate(&self, signal_strength: i32, id: &BeaconId, prior: Option<Position>) -> Position {
        let candidate = self.candidate(signal_strength, id);
        let blended = prior.map_or(candidate, |prior| self.smooth(prior, candidate));
        self.viewport.clamp(blended)
    }

    /// The unsmoothed, unclamped position for a single reading.
    pub fn candidate(&self, signal_strength: i32, id: &BeaconId) -> Position {
        let angle = bearing(id);
        let distance = self.distance(signal_strength);
        Position::new(
            self.center.x + angle.cos() * distance,
            self.center.y + angle.sin() * distance,
        )
    }

    /// Pseudo-distance from the center for a reading.
    ///
    /// The reading is clamped to `[rssi_floor, rssi_ceiling]` and mapped
    /// linearly onto `[0, max_distance]`.
    pub fn distance(&self, signal_strength: i32) -> f64 {
        let clamped = signal_strength.clamp(self.rssi_floor, self.rssi_ceiling);
        let floor = f64::from(self.rssi_floor);
        let span = f64::from(self.rssi_ceiling) - floor;
        (f64::from(clamped) - floor) / span * self.max_distance
    }

    fn smooth(&self, prior: Position, candidate: Position) -> Position {
        let fresh = 1.0 - self.prior_weight;
        Position::new(
            self.prior_weight * prior.x + fresh * candidate.x,
            self.prior_weight * prior.y + fresh * candidate.y,
        )
    }
}

impl Default for PositionEstimator {
    fn default() -> Self {
        Self::new(&EstimatorConfig::default())
    }
}

/// Fixed bearing of a beacon in radians.
pub fn bearing(id: &BeaconId) -> f64 {
    f64::from(id.octet_sum().rem_euclid(FULL_TURN_DEGREES)).to_radians()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn id(raw: &str) -> BeaconId {
        BeaconId::parse(raw).unwrap()
    }

    fn close(a: Position, b: Position) -> bool {
        a.distance_to(b) < EPS
    }

    #[test]
    fn output_stays_inside_viewport_for_any_signal() {
        let estimator = PositionEstimator::default();
        let viewport = Viewport::default();
        let ids = ["00:00", "AA:BB:CC:DD:EE:01", "FF:FF:FF:FF:FF:FF", "5A", "01:02:03"];
        let priors = [
            None,
            Some(Position::new(50.0, 50.0)),
            Some(Position::new(1150.0, 750.0)),
            Some(Position::new(-5000.0, 9000.0)),
        ];

        for raw in ids {
            let beacon = id(raw);
            for signal in -200..=50 {
                for prior in priors {
                    let pos = estimator.estimate(signal, &beacon, prior);
                    assert!(viewport.contains(pos), "{raw} {signal} {prior:?} -> {pos:?}");
                }
            }
        }
        assert!(viewport.contains(estimator.estimate(i32::MIN, &id("AA"), None)));
        assert!(viewport.contains(estimator.estimate(i32::MAX, &id("AA"), None)));
    }

    #[test]
    fn estimate_is_deterministic() {
        let estimator = PositionEstimator::default();
        let beacon = id("AA:BB:CC:DD:EE:01");
        let prior = Some(Position::new(321.0, 123.0));
        let first = estimator.estimate(-63, &beacon, prior);
        for _ in 0..100 {
            let again = estimator.estimate(-63, &beacon, prior);
            assert!(first.x.to_bits() == again.x.to_bits());
            assert!(first.y.to_bits() == again.y.to_bits());
        }
    }

    #[test]
    fn distance_maps_clamped_range_linearly() {
        let estimator = PositionEstimator::default();
        assert!(estimator.distance(-90).abs() < EPS);
        assert!(estimator.distance(-120).abs() < EPS);
        assert!((estimator.distance(-30) - 300.0).abs() < EPS);
        assert!((estimator.distance(0) - 300.0).abs() < EPS);
        assert!((estimator.distance(-60) - 150.0).abs() < EPS);
    }

    #[test]
    fn weakest_signal_sits_at_center() {
        let estimator = PositionEstimator::default();
        let pos = estimator.estimate(-90, &id("12:34"), None);
        assert!(close(pos, Position::new(600.0, 400.0)));
    }

    #[test]
    fn bearing_uses_octet_sum_modulo_full_turn() {
        // 0xAA + 0xBB + 0xCC + 0xDD + 0xEE + 0x01 = 1021, 1021 mod 360 = 301
        let expected = 301.0_f64.to_radians();
        assert!((bearing(&id("AA:BB:CC:DD:EE:01")) - expected).abs() < EPS);
        // 0xB4 + 0xB4 = 360 wraps to zero
        assert!(bearing(&id("B4:B4")).abs() < EPS);
    }

    #[test]
    fn repeated_reports_converge_toward_candidate() {
        let estimator = PositionEstimator::default();
        let beacon = id("AA:BB:CC:DD:EE:01");
        let target = estimator.candidate(-40, &beacon);

        let mut position = estimator.estimate(-90, &beacon, None);
        let mut gap = position.distance_to(target);
        assert!(gap > 1.0);

        for _ in 0..30 {
            position = estimator.estimate(-40, &beacon, Some(position));
            let next_gap = position.distance_to(target);
            assert!(next_gap <= gap, "gap grew from {gap} to {next_gap}");
            gap = next_gap;
        }
        assert!(gap < 0.01);
    }

    #[test]
    fn distinct_octet_sums_give_distinct_candidates() {
        let estimator = PositionEstimator::default();
        let a = id("00:00:00:00:00:01");
        let b = id("00:00:00:00:00:02");
        assert!((bearing(&a) - bearing(&b)).abs() > EPS);
        assert!(!close(estimator.candidate(-50, &a), estimator.candidate(-50, &b)));

        // 1 and 361 collide modulo 360.
        let c = id("FF:6A");
        assert!((bearing(&a) - bearing(&c)).abs() < EPS);
    }

    #[test]
    fn smoothing_moves_thirty_percent_toward_new_candidate() {
        let estimator = PositionEstimator::default();
        let beacon = id("AA:BB:CC:DD:EE:01");

        let first = estimator.estimate(-40, &beacon, None);
        let second = estimator.estimate(-80, &beacon, Some(first));
        let candidate = estimator.candidate(-80, &beacon);

        let expected = Position::new(
            0.7 * first.x + 0.3 * candidate.x,
            0.7 * first.y + 0.3 * candidate.y,
        );
        assert!(close(second, expected));
    }

    #[test]
    fn zero_prior_weight_disables_smoothing() {
        let config = EstimatorConfig {
            prior_weight: 0.0,
            ..EstimatorConfig::default()
        };
        let estimator = PositionEstimator::new(&config);
        let beacon = id("10:20");
        let pos = estimator.estimate(-50, &beacon, Some(Position::new(50.0, 50.0)));
        assert!(close(pos, estimator.candidate(-50, &beacon)));
    }
}
