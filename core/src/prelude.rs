use serde::{Deserialize, Serialize};

use crate::detect::features::FeatureVector;
use crate::trajectory::anomaly::AnomalyFlag;

/// Absolute-value thresholds applied by the rule-based detector.
///
/// Units follow the ingested records: altitude rate in ft/s, speed delta in
/// knots, heading delta in degrees, step distance in nautical miles. The
/// defaults are documented starting points; the caller's configuration is
/// always authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    pub max_altitude_rate: f64,
    pub max_speed_delta: f64,
    pub max_heading_delta: f64,
    pub max_step_distance: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            // 3000 ft/min expressed per second
            max_altitude_rate: 50.0,
            max_speed_delta: 50.0,
            max_heading_delta: 45.0,
            max_step_distance: 10.0,
        }
    }
}

/// Outlier-model algorithm selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelKind {
    Gaussian,
    IsolationForest,
}

/// How model scores are turned into flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ScoreCutoff {
    /// Flag every point whose score exceeds this value.
    Fixed(f64),
    /// Flag points above this percentile of the scored set (0..100).
    Percentile(f64),
}

/// Whether the model is fitted per trajectory or once over the whole batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FitScope {
    PerTrajectory,
    Corpus,
}

/// Rule used by the aggregator to combine severities within one segment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SeverityRule {
    /// Segment severity is the maximum contributing severity.
    #[default]
    Max,
    /// Segment severity is the sum of contributing severities, so a long
    /// run of flagged points outranks a single spike of equal height.
    CountWeighted,
}

/// Configuration for the statistical outlier detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub cutoff: ScoreCutoff,
    pub min_samples: usize,
    pub seed: u64,
    pub fit_timeout_ms: u64,
    pub fit_scope: FitScope,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::IsolationForest,
            cutoff: ScoreCutoff::Percentile(95.0),
            min_samples: 30,
            seed: 0,
            fit_timeout_ms: 5_000,
            fit_scope: FitScope::PerTrajectory,
        }
    }
}

/// Complete configuration surface consumed by a detection pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub thresholds: RuleThresholds,
    pub adjacency_gap: usize,
    pub severity_rule: SeverityRule,
    pub model: ModelConfig,
}

impl PipelineConfig {
    /// Validates the whole surface up front. Any failure here aborts the
    /// run before per-trajectory work starts.
    pub fn validate(&self) -> PipelineResult<()> {
        let t = &self.thresholds;
        for (name, value) in [
            ("max_altitude_rate", t.max_altitude_rate),
            ("max_speed_delta", t.max_speed_delta),
            ("max_heading_delta", t.max_heading_delta),
            ("max_step_distance", t.max_step_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::Config(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        match self.model.cutoff {
            ScoreCutoff::Fixed(v) if !v.is_finite() => {
                return Err(PipelineError::Config(format!(
                    "fixed cutoff must be finite, got {}",
                    v
                )));
            }
            ScoreCutoff::Percentile(p) if !(0.0..=100.0).contains(&p) => {
                return Err(PipelineError::Config(format!(
                    "cutoff percentile must be within 0..=100, got {}",
                    p
                )));
            }
            _ => {}
        }
        if self.model.min_samples < 2 {
            return Err(PipelineError::Config(format!(
                "min_samples must be at least 2, got {}",
                self.model.min_samples
            )));
        }
        Ok(())
    }
}

/// Common error type for the detection pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("bad trajectory data: {0}")]
    Data(String),
    #[error("insufficient data: needed {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Trait implemented by every flag-producing detection stage.
pub trait Detector {
    fn detect(&self, features: &[FeatureVector]) -> PipelineResult<Vec<AnomalyFlag>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let mut config = PipelineConfig::default();
        config.thresholds.max_speed_delta = -1.0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn out_of_range_percentile_is_rejected() {
        let mut config = PipelineConfig::default();
        config.model.cutoff = ScoreCutoff::Percentile(150.0);
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
