use crate::math::geo::{haversine_nm, heading_delta_deg};
use crate::prelude::{PipelineError, PipelineResult};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

/// Per-window derived kinematics, computed over each consecutive point
/// pair. `window_index` is the zero-based index of the window; window `i`
/// describes the transition from point `i` to point `i + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub altitude_rate: f64,
    pub speed_delta: f64,
    pub heading_delta: f64,
    pub step_distance: f64,
    pub window_index: usize,
}

impl FeatureVector {
    /// Feature values in a fixed order, for building the model matrix.
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.altitude_rate,
            self.speed_delta,
            self.heading_delta,
            self.step_distance,
        ]
    }

    pub const DIMENSIONS: usize = 4;
}

/// Derives one feature vector per consecutive point pair.
///
/// A trajectory with fewer than two points yields an empty sequence; the
/// caller decides whether that counts as "insufficient data". A zero time
/// delta is a data error because the trajectory invariant already forbids
/// duplicate timestamps. Output order matches input order.
pub fn extract_features(trajectory: &Trajectory) -> PipelineResult<Vec<FeatureVector>> {
    let points = trajectory.points();
    if points.len() < 2 {
        return Ok(Vec::new());
    }

    let mut features = Vec::with_capacity(points.len() - 1);
    for (window_index, pair) in points.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let dt = next.timestamp - prev.timestamp;
        if dt <= 0.0 {
            return Err(PipelineError::Data(format!(
                "zero or negative time delta in trajectory {} at t={}",
                trajectory.aircraft_id(),
                next.timestamp
            )));
        }

        features.push(FeatureVector {
            altitude_rate: (next.altitude - prev.altitude) / dt,
            speed_delta: next.ground_speed - prev.ground_speed,
            heading_delta: heading_delta_deg(prev.heading, next.heading),
            step_distance: haversine_nm(
                prev.latitude,
                prev.longitude,
                next.latitude,
                next.longitude,
            ),
            window_index,
        });
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::TrajectoryPoint;

    fn point(t: f64, altitude: f64, speed: f64, heading: f64) -> TrajectoryPoint {
        TrajectoryPoint {
            aircraft_id: "a1".to_string(),
            timestamp: t,
            latitude: 48.0,
            longitude: 2.0,
            altitude,
            ground_speed: speed,
            heading,
        }
    }

    #[test]
    fn extractor_yields_one_vector_per_window() {
        let points = (0..10)
            .map(|i| point(i as f64, 30_000.0, 450.0, 90.0))
            .collect();
        let trajectory = Trajectory::new("a1", points).unwrap();
        let features = extract_features(&trajectory).unwrap();
        assert_eq!(features.len(), 9);
        for (i, f) in features.iter().enumerate() {
            assert_eq!(f.window_index, i);
        }
    }

    #[test]
    fn extractor_computes_altitude_rate_over_time_delta() {
        let points = vec![
            point(0.0, 30_000.0, 450.0, 90.0),
            point(2.0, 29_000.0, 450.0, 90.0),
        ];
        let trajectory = Trajectory::new("a1", points).unwrap();
        let features = extract_features(&trajectory).unwrap();
        assert_eq!(features[0].altitude_rate, -500.0);
    }

    #[test]
    fn extractor_normalizes_heading_through_north() {
        let points = vec![
            point(0.0, 30_000.0, 450.0, 10.0),
            point(1.0, 30_000.0, 450.0, 350.0),
        ];
        let trajectory = Trajectory::new("a1", points).unwrap();
        let features = extract_features(&trajectory).unwrap();
        assert_eq!(features[0].heading_delta, -20.0);
    }

    #[test]
    fn single_point_trajectory_yields_empty_features() {
        let trajectory = Trajectory::new("a1", vec![point(0.0, 30_000.0, 450.0, 90.0)]).unwrap();
        assert!(extract_features(&trajectory).unwrap().is_empty());
    }
}
