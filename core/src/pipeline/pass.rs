use crate::detect::aggregate::Aggregator;
use crate::detect::features::extract_features;
use crate::detect::model::{ModelState, OutlierModel};
use crate::detect::rules::RuleDetector;
use crate::prelude::{Detector, PipelineConfig, PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use crate::trajectory::{AnomalySegment, Trajectory};
use serde::{Deserialize, Serialize};

/// Result of one detection pass over one trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryReport {
    pub aircraft_id: String,
    pub point_count: usize,
    pub segments: Vec<AnomalySegment>,
    /// Degradations that did not fail the pass, e.g. a model stage that
    /// had too few samples to fit.
    pub notes: Vec<String>,
}

/// Where a detection pass obtains its outlier-model state.
///
/// The caller's fit scope is binding: a pass never falls back from one
/// source to another on its own.
#[derive(Debug, Clone, Copy)]
pub enum ModelSource<'a> {
    /// Fit on this trajectory's own features.
    Local,
    /// Score against an externally fitted, shared state.
    Shared(&'a ModelState),
    /// Model stage unavailable for this run; record why, rules only.
    Disabled(&'a str),
}

/// Single-trajectory pipeline: feature extraction, rule and model
/// detection, aggregation. Owns no state between runs; all derived data
/// is dropped once the report is built.
pub struct DetectionPass {
    config: PipelineConfig,
    logger: LogManager,
}

impl DetectionPass {
    /// Validates the configuration up front; an invalid surface never
    /// reaches per-trajectory work.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            logger: LogManager::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pass, fitting the outlier model on this trajectory alone.
    pub fn run(&self, trajectory: &Trajectory) -> PipelineResult<TrajectoryReport> {
        self.run_with_model(trajectory, ModelSource::Local)
    }

    /// Runs the pass with an explicit model source.
    pub fn run_with_model(
        &self,
        trajectory: &Trajectory,
        source: ModelSource<'_>,
    ) -> PipelineResult<TrajectoryReport> {
        let features = extract_features(trajectory)?;
        if features.is_empty() {
            return Err(PipelineError::InsufficientData {
                needed: 2,
                got: trajectory.len(),
            });
        }

        let mut notes = Vec::new();
        let mut flags = RuleDetector::new(self.config.thresholds.clone()).detect(&features)?;

        let model = OutlierModel::new(self.config.model.clone());
        let model_flags = match source {
            ModelSource::Shared(state) => Some(model.flags(state, &features)),
            ModelSource::Local => match model.fit(&features) {
                Ok(state) => Some(model.flags(&state, &features)),
                Err(PipelineError::InsufficientData { needed, got }) => {
                    // Rule detection still stands on its own; record why
                    // the model stage contributed nothing.
                    notes.push(format!(
                        "model stage skipped: needed {} samples, got {}",
                        needed, got
                    ));
                    None
                }
                Err(err) => return Err(err),
            },
            ModelSource::Disabled(reason) => {
                notes.push(format!("model stage skipped: {}", reason));
                None
            }
        };
        if let Some(model_flags) = model_flags {
            flags.extend(model_flags);
        }

        let segments = Aggregator::new(self.config.adjacency_gap, self.config.severity_rule)
            .aggregate(flags);
        self.logger.record(&format!(
            "DetectionPass {} -> {} segments",
            trajectory.aircraft_id(),
            segments.len()
        ));

        Ok(TrajectoryReport {
            aircraft_id: trajectory.aircraft_id().to_string(),
            point_count: trajectory.len(),
            segments,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::{FlagSource, TrajectoryPoint};

    fn point(t: f64, altitude: f64) -> TrajectoryPoint {
        TrajectoryPoint {
            aircraft_id: "a1".to_string(),
            timestamp: t,
            latitude: 48.0 + t * 0.0001,
            longitude: 2.0,
            altitude,
            ground_speed: 450.0,
            heading: 90.0,
        }
    }

    #[test]
    fn altitude_drop_yields_one_rule_segment() {
        // Five points, one 5000 ft drop over one second, everything else
        // within normal bounds.
        let points = vec![
            point(0.0, 30_000.0),
            point(1.0, 30_000.0),
            point(2.0, 25_000.0),
            point(3.0, 25_000.0),
            point(4.0, 25_000.0),
        ];
        let trajectory = Trajectory::new("a1", points).unwrap();
        let pass = DetectionPass::new(PipelineConfig::default()).unwrap();

        let report = pass.run(&trajectory).unwrap();
        assert_eq!(report.segments.len(), 1);
        let segment = &report.segments[0];
        assert!(segment.contains(1), "drop window is index 1");
        assert!(segment
            .contributing_flags
            .iter()
            .all(|f| f.source == FlagSource::Rule));
        // 4 windows is far below min_samples, so the model stage stood down
        assert_eq!(report.notes.len(), 1);
    }

    #[test]
    fn single_point_trajectory_is_insufficient() {
        let trajectory = Trajectory::new("a1", vec![point(0.0, 30_000.0)]).unwrap();
        let pass = DetectionPass::new(PipelineConfig::default()).unwrap();
        assert!(matches!(
            pass.run(&trajectory),
            Err(PipelineError::InsufficientData { got: 1, .. })
        ));
    }

    #[test]
    fn invalid_config_fails_before_processing() {
        let mut config = PipelineConfig::default();
        config.thresholds.max_heading_delta = f64::NAN;
        assert!(matches!(
            DetectionPass::new(config),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn disabled_model_source_never_refits_locally() {
        // 50 points give plenty of samples for a local fit; a disabled
        // source must still keep the model stage out of the pass.
        let mut points: Vec<TrajectoryPoint> =
            (0..50).map(|i| point(i as f64, 30_000.0)).collect();
        points[20].altitude = 24_000.0;
        for p in points.iter_mut().skip(21) {
            p.altitude = 24_000.0;
        }
        let trajectory = Trajectory::new("a1", points).unwrap();
        let pass = DetectionPass::new(PipelineConfig::default()).unwrap();

        let report = pass
            .run_with_model(&trajectory, ModelSource::Disabled("shared fit unavailable"))
            .unwrap();
        assert!(report
            .notes
            .iter()
            .any(|n| n.contains("shared fit unavailable")));
        for segment in &report.segments {
            assert!(segment
                .contributing_flags
                .iter()
                .all(|f| f.source == FlagSource::Rule));
        }
    }

    #[test]
    fn quiet_trajectory_produces_no_rule_segments() {
        let points = (0..5).map(|i| point(i as f64, 30_000.0)).collect();
        let trajectory = Trajectory::new("a1", points).unwrap();
        let pass = DetectionPass::new(PipelineConfig::default()).unwrap();
        let report = pass.run(&trajectory).unwrap();
        assert!(report.segments.is_empty());
    }
}
