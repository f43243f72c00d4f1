use crate::generator::tracks::build_tracks;
use crate::workflow::config::RunConfig;
use anyhow::Context;
use trajcore::pipeline::{BatchRunner, TrajectoryOutcome};
use trajcore::trajectory::{group_rows, RawRow, Trajectory};

/// Collected results of one batch run.
pub struct BatchSummary {
    pub outcomes: Vec<TrajectoryOutcome>,
    pub analyzed: usize,
    pub skipped: usize,
    pub segment_count: usize,
}

impl BatchSummary {
    fn from_outcomes(outcomes: Vec<TrajectoryOutcome>) -> Self {
        let mut analyzed = 0;
        let mut skipped = 0;
        let mut segment_count = 0;
        for outcome in &outcomes {
            match outcome {
                TrajectoryOutcome::Analyzed(report) => {
                    analyzed += 1;
                    segment_count += report.segments.len();
                }
                TrajectoryOutcome::Skipped { .. } => skipped += 1,
            }
        }
        Self {
            outcomes,
            analyzed,
            skipped,
            segment_count,
        }
    }
}

#[derive(Clone)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Runs the detection batch over already-validated trajectories.
    pub async fn execute(&self, trajectories: Vec<Trajectory>) -> anyhow::Result<BatchSummary> {
        let batch = BatchRunner::new(self.config.pipeline.clone())
            .context("validating pipeline configuration")?;
        let outcomes = batch.run(trajectories).await;
        let summary = BatchSummary::from_outcomes(outcomes);
        log::info!(
            "batch summary: {} analyzed, {} skipped, {} segments",
            summary.analyzed,
            summary.skipped,
            summary.segment_count
        );
        Ok(summary)
    }

    /// Groups raw rows by aircraft, then runs the batch. Aircraft whose
    /// rows fail validation show up as skipped outcomes, not errors.
    pub async fn execute_rows(&self, rows: Vec<RawRow>) -> anyhow::Result<BatchSummary> {
        let (trajectories, rejected) = group_rows(rows);
        let mut summary = self.execute(trajectories).await?;
        for (aircraft_id, err) in rejected {
            summary.skipped += 1;
            summary.outcomes.push(TrajectoryOutcome::Skipped {
                aircraft_id,
                reason: err.to_string(),
            });
        }
        summary
            .outcomes
            .sort_by(|a, b| a.aircraft_id().cmp(b.aircraft_id()));
        Ok(summary)
    }

    /// Generates the configured synthetic tracks and analyzes them.
    pub async fn execute_generated(&self) -> anyhow::Result<BatchSummary> {
        let tracks = build_tracks(&self.config.generator).context("generating tracks")?;
        self.execute(tracks).await
    }
}
