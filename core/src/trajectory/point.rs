use crate::prelude::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single observed state of one aircraft. Immutable once ingested.
///
/// Units: timestamp in Unix seconds, altitude in feet, ground speed in
/// knots, heading in degrees clockwise from true north.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub aircraft_id: String,
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub ground_speed: f64,
    pub heading: f64,
}

/// Raw tabular row as supplied by an external ingestion collaborator.
///
/// Kept structurally identical to [`TrajectoryPoint`] so any row source
/// (file, API, generator) can feed the pipeline without conversion glue.
pub type RawRow = TrajectoryPoint;

/// Time-ordered point sequence for one aircraft over a continuous span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    aircraft_id: String,
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    /// Builds a trajectory, enforcing the ordering invariant.
    ///
    /// Fails with a data error when the point list is empty, when a point
    /// carries a different aircraft id, when any coordinate is non-finite,
    /// or when timestamps are not strictly increasing (duplicates
    /// included). Bad ordering is rejected rather than repaired so a
    /// malformed source file cannot silently reshuffle a flight.
    pub fn new(aircraft_id: impl Into<String>, points: Vec<TrajectoryPoint>) -> PipelineResult<Self> {
        let aircraft_id = aircraft_id.into();
        if points.is_empty() {
            return Err(PipelineError::Data(format!(
                "trajectory {} has no points",
                aircraft_id
            )));
        }

        let mut previous: Option<f64> = None;
        for point in &points {
            if point.aircraft_id != aircraft_id {
                return Err(PipelineError::Data(format!(
                    "point for {} mixed into trajectory {}",
                    point.aircraft_id, aircraft_id
                )));
            }
            for (name, value) in [
                ("timestamp", point.timestamp),
                ("latitude", point.latitude),
                ("longitude", point.longitude),
                ("altitude", point.altitude),
                ("ground_speed", point.ground_speed),
                ("heading", point.heading),
            ] {
                if !value.is_finite() {
                    return Err(PipelineError::Data(format!(
                        "non-finite {} in trajectory {} at t={}",
                        name, aircraft_id, point.timestamp
                    )));
                }
            }
            if let Some(prev) = previous {
                if point.timestamp <= prev {
                    return Err(PipelineError::Data(format!(
                        "non-increasing timestamp in trajectory {}: {} after {}",
                        aircraft_id, point.timestamp, prev
                    )));
                }
            }
            previous = Some(point.timestamp);
        }

        Ok(Self {
            aircraft_id,
            points,
        })
    }

    pub fn aircraft_id(&self) -> &str {
        &self.aircraft_id
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Groups an arbitrary row iterator into one validated trajectory per
/// aircraft id, preserving the order rows arrived in.
///
/// Each trajectory validates independently; one malformed aircraft does
/// not reject the rest. Returns the validated trajectories alongside the
/// per-aircraft rejections.
pub fn group_rows<I>(rows: I) -> (Vec<Trajectory>, Vec<(String, PipelineError)>)
where
    I: IntoIterator<Item = RawRow>,
{
    let mut grouped: BTreeMap<String, Vec<RawRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.aircraft_id.clone()).or_default().push(row);
    }

    let mut trajectories = Vec::new();
    let mut rejected = Vec::new();
    for (aircraft_id, points) in grouped {
        match Trajectory::new(aircraft_id.clone(), points) {
            Ok(trajectory) => trajectories.push(trajectory),
            Err(err) => rejected.push((aircraft_id, err)),
        }
    }
    (trajectories, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn make_point(id: &str, t: f64) -> TrajectoryPoint {
        TrajectoryPoint {
            aircraft_id: id.to_string(),
            timestamp: t,
            latitude: 48.0,
            longitude: 2.0,
            altitude: 30_000.0,
            ground_speed: 450.0,
            heading: 90.0,
        }
    }

    #[test]
    fn trajectory_accepts_strictly_increasing_timestamps() {
        let points = vec![make_point("a1", 0.0), make_point("a1", 1.0)];
        let trajectory = Trajectory::new("a1", points).unwrap();
        assert_eq!(trajectory.len(), 2);
    }

    #[test]
    fn trajectory_rejects_duplicate_timestamps() {
        let points = vec![make_point("a1", 5.0), make_point("a1", 5.0)];
        assert!(matches!(
            Trajectory::new("a1", points),
            Err(PipelineError::Data(_))
        ));
    }

    #[test]
    fn trajectory_rejects_backwards_timestamps() {
        let points = vec![make_point("a1", 5.0), make_point("a1", 4.0)];
        assert!(matches!(
            Trajectory::new("a1", points),
            Err(PipelineError::Data(_))
        ));
    }

    #[test]
    fn trajectory_rejects_non_finite_coordinates() {
        let mut bad = make_point("a1", 1.0);
        bad.latitude = f64::NAN;
        assert!(Trajectory::new("a1", vec![bad]).is_err());
    }

    #[test]
    fn group_rows_isolates_bad_aircraft() {
        let rows = vec![
            make_point("good", 0.0),
            make_point("good", 1.0),
            make_point("bad", 3.0),
            make_point("bad", 3.0),
        ];
        let (trajectories, rejected) = group_rows(rows);
        assert_eq!(trajectories.len(), 1);
        assert_eq!(trajectories[0].aircraft_id(), "good");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "bad");
    }
}
