use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use trajcore::trajectory::{Trajectory, TrajectoryPoint};

/// Configuration for generating synthetic flight tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub flights: usize,
    pub points: usize,
    /// Seconds between consecutive points.
    pub interval_s: f64,
    pub seed: u64,
    /// Probability that a flight carries one injected anomalous event.
    pub anomaly_rate: f64,
    pub description: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            flights: 8,
            points: 120,
            interval_s: 10.0,
            seed: 0,
            anomaly_rate: 0.5,
            description: None,
        }
    }
}

impl GeneratorConfig {
    fn normalized_points(&self) -> usize {
        self.points.max(2)
    }
}

#[derive(Debug, Clone, Copy)]
enum InjectedEvent {
    AltitudeDrop,
    SpeedSpike,
    HeadingSwing,
}

/// Builds one smooth cruise trajectory, optionally perturbed by a single
/// injected event somewhere in the middle of the flight.
fn build_track(config: &GeneratorConfig, flight: usize, rng: &mut StdRng) -> anyhow::Result<Trajectory> {
    let aircraft_id = format!("ac{:03}", flight + 1);
    let points = config.normalized_points();

    let mut latitude = rng.gen_range(35.0..55.0);
    let mut longitude = rng.gen_range(-10.0..20.0);
    let mut altitude = rng.gen_range(28_000.0..34_000.0);
    let mut speed: f64 = rng.gen_range(430.0..470.0);
    let mut heading: f64 = rng.gen_range(0.0..360.0);

    let event = if rng.gen_bool(config.anomaly_rate.clamp(0.0, 1.0)) {
        let at = rng.gen_range(points / 4..points * 3 / 4);
        let kind = match rng.gen_range(0..3) {
            0 => InjectedEvent::AltitudeDrop,
            1 => InjectedEvent::SpeedSpike,
            _ => InjectedEvent::HeadingSwing,
        };
        Some((at, kind))
    } else {
        None
    };

    let mut track = Vec::with_capacity(points);
    for i in 0..points {
        if let Some((at, kind)) = event {
            if i == at {
                match kind {
                    InjectedEvent::AltitudeDrop => altitude -= 5_000.0,
                    InjectedEvent::SpeedSpike => speed += 150.0,
                    InjectedEvent::HeadingSwing => heading = (heading + 120.0) % 360.0,
                }
            }
        }

        // gentle cruise jitter, well inside the default thresholds
        altitude += rng.gen_range(-40.0..40.0);
        speed = (speed + rng.gen_range(-3.0..3.0)).max(120.0);
        heading = (heading + rng.gen_range(-2.0..2.0)).rem_euclid(360.0);

        track.push(TrajectoryPoint {
            aircraft_id: aircraft_id.clone(),
            timestamp: i as f64 * config.interval_s.max(1.0),
            latitude,
            longitude,
            altitude,
            ground_speed: speed,
            heading,
        });

        // advance the position along the current heading
        let step_nm = speed * config.interval_s.max(1.0) / 3_600.0;
        let heading_rad = heading.to_radians();
        latitude += step_nm * heading_rad.cos() / 60.0;
        longitude += step_nm * heading_rad.sin() / (60.0 * latitude.to_radians().cos());
    }

    Trajectory::new(aircraft_id.clone(), track)
        .with_context(|| format!("building synthetic track {}", aircraft_id))
}

/// Generates the configured number of seeded synthetic trajectories.
pub fn build_tracks(config: &GeneratorConfig) -> anyhow::Result<Vec<Trajectory>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.flights.max(1))
        .map(|flight| build_track(config, flight, &mut rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_expected_track_count() {
        let config = GeneratorConfig {
            flights: 5,
            points: 40,
            ..Default::default()
        };
        let tracks = build_tracks(&config).unwrap();
        assert_eq!(tracks.len(), 5);
        for track in &tracks {
            assert_eq!(track.len(), 40);
        }
    }

    #[test]
    fn generator_is_deterministic_for_fixed_seed() {
        let config = GeneratorConfig {
            flights: 2,
            points: 20,
            seed: 42,
            ..Default::default()
        };
        let first = build_tracks(&config).unwrap();
        let second = build_tracks(&config).unwrap();
        let a = &first[0].points()[7];
        let b = &second[0].points()[7];
        assert_eq!(a.latitude, b.latitude);
        assert_eq!(a.altitude, b.altitude);
    }

    #[test]
    fn quiet_generator_stays_within_default_thresholds() {
        let config = GeneratorConfig {
            flights: 3,
            points: 50,
            anomaly_rate: 0.0,
            ..Default::default()
        };
        let tracks = build_tracks(&config).unwrap();
        for track in &tracks {
            let features = trajcore::detect::extract_features(track).unwrap();
            for f in features {
                assert!(f.altitude_rate.abs() <= 50.0);
                assert!(f.speed_delta.abs() <= 50.0);
                assert!(f.heading_delta.abs() <= 45.0);
            }
        }
    }
}
