//! Synthetic beacons for running the tracker without hardware.
//!
//! Each simulated beacon has a fixed MAC and a signal strength that
//! random-walks inside [`RSSI_MIN`, `RSSI_MAX`]. The walk is driven by a
//! seeded [`StdRng`], so a given seed always produces the same reports.

use std::time::Duration;

use beaconwatch_types::IngestRequest;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::SimulationConfig;

/// Weakest simulated signal.
pub const RSSI_MIN: i64 = -95;
/// Strongest simulated signal.
pub const RSSI_MAX: i64 = -35;
/// Largest change between two consecutive readings.
const MAX_STEP: i64 = 4;

#[derive(Debug, Clone)]
struct SimBeacon {
    mac: String,
    label: String,
    rssi: i64,
}

/// Generates rounds of reports for a fixed set of synthetic beacons.
#[derive(Debug)]
pub struct Simulator {
    rng: StdRng,
    beacons: Vec<SimBeacon>,
}

impl Simulator {
    /// Create `count` beacons from `seed`.
    pub fn new(count: u16, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let beacons = (0..count)
            .map(|index| {
                let [hi, lo] = index.to_be_bytes();
                SimBeacon {
                    mac: format!("AC:23:3F:00:{hi:02X}:{lo:02X}"),
                    label: format!("Sim-{index:03}"),
                    rssi: rng.random_range(-80..=-50),
                }
            })
            .collect();
        Self { rng, beacons }
    }

    /// Step every beacon's signal and return one report per beacon.
    pub fn next_round(&mut self) -> Vec<IngestRequest> {
        let Self { rng, beacons } = self;
        beacons
            .iter_mut()
            .map(|beacon| {
                let step = rng.random_range(-MAX_STEP..=MAX_STEP);
                beacon.rssi = beacon.rssi.saturating_add(step).clamp(RSSI_MIN, RSSI_MAX);
                IngestRequest::new(beacon.mac.clone(), Some(beacon.label.clone()), beacon.rssi)
            })
            .collect()
    }
}

/// Push one round of simulated reports every `config.interval` until the
/// receiving side closes. Returns the number of reports queued.
pub async fn run_simulation(config: &SimulationConfig, reports: mpsc::Sender<IngestRequest>) -> u64 {
    let mut simulator = Simulator::new(config.beacons, config.seed);
    let mut interval = tokio::time::interval(config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        beacons = config.beacons,
        interval_ms = duration_ms(config.interval),
        seed = config.seed,
        "Simulation started"
    );

    let mut queued: u64 = 0;
    loop {
        interval.tick().await;
        for report in simulator.next_round() {
            if reports.send(report).await.is_err() {
                debug!(queued, "Report channel closed, stopping simulation");
                return queued;
            }
            queued = queued.saturating_add(1);
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use beaconwatch_types::BeaconId;

    use super::*;

    #[test]
    fn same_seed_same_reports() {
        let mut a = Simulator::new(4, 99);
        let mut b = Simulator::new(4, 99);
        for _ in 0..20 {
            assert_eq!(a.next_round(), b.next_round());
        }
    }

    #[test]
    fn rssi_stays_in_range() {
        let mut simulator = Simulator::new(8, 1);
        for _ in 0..500 {
            for report in simulator.next_round() {
                let rssi = report.signal_strength.unwrap();
                assert!((RSSI_MIN..=RSSI_MAX).contains(&rssi), "rssi {rssi}");
            }
        }
    }

    #[test]
    fn macs_are_distinct_valid_ids() {
        let round = Simulator::new(300, 5).next_round();
        assert_eq!(round.len(), 300);

        let mut ids: Vec<BeaconId> = round
            .into_iter()
            .map(|report| report.validate().unwrap().id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_channel_closes() {
        let config = SimulationConfig {
            beacons: 3,
            interval: Duration::from_millis(100),
            seed: 42,
        };
        let (tx, mut rx) = mpsc::channel(16);
        let task = tokio::spawn(async move { run_simulation(&config, tx).await });

        for _ in 0..6 {
            assert!(rx.recv().await.is_some());
        }
        drop(rx);

        let queued = task.await.unwrap();
        assert!(queued >= 6);
    }
}
