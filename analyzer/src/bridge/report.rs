use crate::bridge::model::ReportModel;
use crate::workflow::runner::Runner;
use anyhow::Result;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use trajcore::trajectory::RawRow;
use warp::{http::StatusCode, Filter};

fn report_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9100))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

/// Bridge that hosts the report HTTP endpoint and analyzes posted rows.
///
/// `GET /report` serves the latest published batch; `POST /ingest` takes
/// a JSON array of raw trajectory rows, runs the pipeline, and replaces
/// the published report.
pub struct ReportBridge {
    state: Arc<RwLock<ReportModel>>,
}

impl ReportBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        let state = Arc::new(RwLock::new(ReportModel::default()));
        let state_for_filter = state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let get_route = warp::path("report")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<ReportModel>>| warp::reply::json(&*state.read().unwrap()));

        let ingest_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |rows: Vec<RawRow>,
                 state: Arc<RwLock<ReportModel>>,
                 runner: Arc<Runner>| async move {
                    match runner.execute_rows(rows).await {
                        Ok(summary) => {
                            let model = ReportModel::from_summary(&summary);
                            let mut guard = state.write().unwrap();
                            *guard = model;
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "analyzed": summary.analyzed,
                                    "skipped": summary.skipped,
                                    "segments": summary.segment_count,
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            eprintln!("ingest error: {}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = get_route.or(ingest_route);
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                warp::serve(routes).run(report_bind_address()).await;
            });
        });

        Self { state }
    }

    pub fn publish(&self, model: &ReportModel) -> Result<()> {
        let mut guard = self.state.write().unwrap();
        *guard = model.clone();
        println!(
            "[REPORT] outcomes: {}, segments: {}",
            guard.outcomes.len(),
            guard.segment_count
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[REPORT] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ReportModel {
        self.state.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::RunConfig;
    use crate::workflow::runner::Runner;
    use std::sync::Arc;

    #[tokio::test]
    async fn report_bridge_updates_state() {
        let mut config = RunConfig::from_args(2, 50, 1);
        config.generator.anomaly_rate = 1.0;
        let runner = Arc::new(Runner::new(config));
        let bridge = ReportBridge::new(runner.clone());

        let summary = runner.execute_generated().await.unwrap();
        let model = ReportModel::from_summary(&summary);
        bridge.publish(&model).unwrap();

        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.outcomes.len(), 2);
        assert_eq!(snapshot.segment_count, summary.segment_count);
    }
}
