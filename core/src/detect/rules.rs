use crate::detect::features::FeatureVector;
use crate::prelude::{Detector, PipelineResult, RuleThresholds};
use crate::telemetry::log::LogManager;
use crate::trajectory::AnomalyFlag;

/// Fixed-threshold detector over the derived features.
///
/// Every violated threshold produces its own flag, so a window that
/// simultaneously breaks the altitude and speed limits contributes two
/// flags with distinct reasons. Provenance is resolved later by the
/// aggregator, never here.
pub struct RuleDetector {
    thresholds: RuleThresholds,
    logger: LogManager,
}

impl RuleDetector {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self {
            thresholds,
            logger: LogManager::new(),
        }
    }
}

impl Detector for RuleDetector {
    fn detect(&self, features: &[FeatureVector]) -> PipelineResult<Vec<AnomalyFlag>> {
        let t = &self.thresholds;
        let mut flags = Vec::new();

        for feature in features {
            let checks = [
                ("altitude_rate", feature.altitude_rate, t.max_altitude_rate, "ft/s"),
                ("speed_delta", feature.speed_delta, t.max_speed_delta, "kt"),
                ("heading_delta", feature.heading_delta, t.max_heading_delta, "deg"),
                ("step_distance", feature.step_distance, t.max_step_distance, "nm"),
            ];
            for (name, value, limit, unit) in checks {
                if value.abs() > limit {
                    let severity = if limit > 0.0 {
                        value.abs() / limit
                    } else {
                        value.abs()
                    };
                    flags.push(AnomalyFlag::rule(
                        feature.window_index,
                        format!("{} {:.2} {} exceeds limit {:.2}", name, value, unit, limit),
                        severity,
                    ));
                }
            }
        }

        self.logger
            .record(&format!("RuleDetector flagged {} windows", flags.len()));
        Ok(flags)
    }
}
