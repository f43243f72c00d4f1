use crate::detect::features::{extract_features, FeatureVector};
use crate::detect::model::{ModelState, OutlierModel};
use crate::pipeline::pass::{DetectionPass, ModelSource, TrajectoryReport};
use crate::prelude::{FitScope, PipelineConfig, PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::BatchMetrics;
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio::time::timeout;

/// Per-trajectory result of a batch run. Failures are reported alongside
/// successes, never dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrajectoryOutcome {
    Analyzed(TrajectoryReport),
    Skipped { aircraft_id: String, reason: String },
}

impl TrajectoryOutcome {
    pub fn aircraft_id(&self) -> &str {
        match self {
            TrajectoryOutcome::Analyzed(report) => &report.aircraft_id,
            TrajectoryOutcome::Skipped { aircraft_id, .. } => aircraft_id,
        }
    }
}

/// How the batch supplies model state to its passes, resolved once
/// before any task is spawned.
#[derive(Clone)]
enum BatchModel {
    /// Per-trajectory scope: each pass fits its own state.
    Local,
    /// Corpus scope with a successful shared fit.
    Shared(Arc<ModelState>),
    /// Corpus scope whose fit failed: every pass runs rules only. The
    /// caller chose corpus fitting, so nothing refits per trajectory.
    Unavailable(String),
}

/// Runs the detection pass over many trajectories in parallel.
///
/// Each trajectory is owned by its own task with no shared mutable state;
/// outcomes flow back over a channel and are collected by the single
/// caller. Each pass runs on a blocking thread under the configured fit
/// budget (model fitting dominates the cost), and exceeding it skips
/// that one trajectory rather than aborting the batch. Only
/// configuration errors are fatal, and those fire before any task is
/// spawned.
pub struct BatchRunner {
    config: Arc<PipelineConfig>,
    metrics: Arc<BatchMetrics>,
    logger: LogManager,
}

impl BatchRunner {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            metrics: Arc::new(BatchMetrics::new()),
            logger: LogManager::new(),
        })
    }

    pub fn metrics(&self) -> Arc<BatchMetrics> {
        self.metrics.clone()
    }

    pub async fn run(&self, trajectories: Vec<Trajectory>) -> Vec<TrajectoryOutcome> {
        let fit_budget = Duration::from_millis(self.config.model.fit_timeout_ms);
        let batch_model = match self.config.model.fit_scope {
            FitScope::Corpus => match self.fit_corpus(&trajectories, fit_budget).await {
                Ok(state) => BatchModel::Shared(state),
                Err(reason) => BatchModel::Unavailable(reason),
            },
            FitScope::PerTrajectory => BatchModel::Local,
        };

        let (tx, mut rx) = mpsc::channel(trajectories.len().max(1));
        let count = trajectories.len();

        for trajectory in trajectories {
            let tx = tx.clone();
            let config = self.config.clone();
            let metrics = self.metrics.clone();
            let batch_model = batch_model.clone();
            task::spawn(async move {
                let outcome =
                    analyze_one(config, batch_model, trajectory, fit_budget).await;
                match &outcome {
                    TrajectoryOutcome::Analyzed(report) => {
                        metrics.record_analyzed(report.segments.len())
                    }
                    TrajectoryOutcome::Skipped { .. } => metrics.record_skipped(),
                }
                // receiver only closes once every task finished
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(count);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes.sort_by(|a, b| a.aircraft_id().cmp(b.aircraft_id()));

        let (analyzed, skipped, segments) = self.metrics.snapshot();
        self.logger.record(&format!(
            "batch complete: {} analyzed, {} skipped, {} segments",
            analyzed, skipped, segments
        ));
        outcomes
    }

    /// Fits one model state over the combined feature matrix of every
    /// usable trajectory. Failures degrade the whole batch to rule-only
    /// detection; the returned reason is recorded by every pass.
    async fn fit_corpus(
        &self,
        trajectories: &[Trajectory],
        fit_budget: Duration,
    ) -> Result<Arc<ModelState>, String> {
        let mut combined: Vec<FeatureVector> = Vec::new();
        for trajectory in trajectories {
            match extract_features(trajectory) {
                Ok(features) => combined.extend(features),
                // the per-trajectory pass will surface this one's error
                Err(_) => continue,
            }
        }

        let model = OutlierModel::new(self.config.model.clone());
        let fit = task::spawn_blocking(move || model.fit(&combined));
        let reason = match timeout(fit_budget, fit).await {
            Ok(Ok(Ok(state))) => return Ok(Arc::new(state)),
            Ok(Ok(Err(err))) => format!("corpus fit unavailable: {}", err),
            Ok(Err(join_err)) => format!("corpus fit task failed: {}", join_err),
            Err(_) => format!(
                "corpus fit exceeded the {} ms budget",
                fit_budget.as_millis()
            ),
        };
        self.logger.record(&reason);
        Err(reason)
    }
}

async fn analyze_one(
    config: Arc<PipelineConfig>,
    batch_model: BatchModel,
    trajectory: Trajectory,
    fit_budget: Duration,
) -> TrajectoryOutcome {
    let aircraft_id = trajectory.aircraft_id().to_string();
    let work = task::spawn_blocking(move || {
        let pass = DetectionPass::new((*config).clone())?;
        let source = match &batch_model {
            BatchModel::Local => ModelSource::Local,
            BatchModel::Shared(state) => ModelSource::Shared(state),
            BatchModel::Unavailable(reason) => ModelSource::Disabled(reason),
        };
        pass.run_with_model(&trajectory, source)
    });

    match timeout(fit_budget, work).await {
        Ok(Ok(Ok(report))) => TrajectoryOutcome::Analyzed(report),
        Ok(Ok(Err(err))) => TrajectoryOutcome::Skipped {
            aircraft_id,
            reason: err.to_string(),
        },
        Ok(Err(join_err)) => TrajectoryOutcome::Skipped {
            aircraft_id,
            reason: format!("worker task failed: {}", join_err),
        },
        Err(_) => TrajectoryOutcome::Skipped {
            aircraft_id,
            reason: PipelineError::Timeout(format!(
                "detection pass exceeded the {} ms fit budget",
                fit_budget.as_millis()
            ))
            .to_string(),
        },
    }
}
