use serde::{Deserialize, Serialize};
use trajcore::pipeline::TrajectoryOutcome;

/// Latest batch results published for external reporting consumers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportModel {
    pub outcomes: Vec<TrajectoryOutcome>,
    pub analyzed: usize,
    pub skipped: usize,
    pub segment_count: usize,
}

impl ReportModel {
    pub fn from_summary(summary: &crate::workflow::runner::BatchSummary) -> Self {
        Self {
            outcomes: summary.outcomes.clone(),
            analyzed: summary.analyzed,
            skipped: summary.skipped,
            segment_count: summary.segment_count,
        }
    }
}
