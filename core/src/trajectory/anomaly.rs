use serde::{Deserialize, Serialize};

/// Which detection stage produced a flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlagSource {
    Rule,
    Model,
}

/// Single flagged feature index. Never mutated after creation.
///
/// `index` refers to the feature window, i.e. the transition into point
/// `index + 1` of the source trajectory. `severity` is the exceedance
/// ratio for rule flags and the raw model score for model flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub index: usize,
    pub source: FlagSource,
    pub reason: String,
    pub severity: f64,
}

impl AnomalyFlag {
    pub fn rule(index: usize, reason: impl Into<String>, severity: f64) -> Self {
        Self {
            index,
            source: FlagSource::Rule,
            reason: reason.into(),
            severity,
        }
    }

    pub fn model(index: usize, score: f64) -> Self {
        Self {
            index,
            source: FlagSource::Model,
            reason: format!("outlier score {:.4}", score),
            severity: score,
        }
    }
}

/// Contiguous run of flagged indices representing one abnormal event.
/// Immutable once emitted by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySegment {
    pub start_index: usize,
    pub end_index: usize,
    pub contributing_flags: Vec<AnomalyFlag>,
    pub aggregate_severity: f64,
}

impl AnomalySegment {
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }

    /// Number of distinct flagged indices covered by the segment.
    pub fn span(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}
