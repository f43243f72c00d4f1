use anyhow::Context;
use bridge::model::ReportModel;
use bridge::report::ReportBridge;
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use trajcore::pipeline::TrajectoryOutcome;
use workflow::config::RunConfig;
use workflow::runner::Runner;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Trajectory anomaly-detection batch driver")]
struct Args {
    /// Run one offline batch over generated tracks and emit a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a run config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 8)]
    flights: usize,
    #[arg(long, default_value_t = 120)]
    points: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Keep the report bridge alive for incoming row batches
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let run_config = if let Some(path) = args.config {
        RunConfig::load(path)?
    } else {
        RunConfig::from_args(args.flights, args.points, args.seed)
    };
    run_config
        .pipeline
        .validate()
        .context("validating pipeline configuration")?;

    let runner = Arc::new(Runner::new(run_config));
    let bridge = ReportBridge::new(runner.clone());

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating batch runtime")?;

    if args.offline {
        let summary = runtime.block_on(runner.execute_generated())?;

        println!(
            "Offline run -> {} analyzed, {} skipped, {} segments",
            summary.analyzed, summary.skipped, summary.segment_count
        );
        for outcome in &summary.outcomes {
            match outcome {
                TrajectoryOutcome::Analyzed(report) => {
                    for segment in &report.segments {
                        println!(
                            "  {} windows {}..{} severity {:.2}",
                            report.aircraft_id,
                            segment.start_index,
                            segment.end_index,
                            segment.aggregate_severity
                        );
                    }
                }
                TrajectoryOutcome::Skipped { aircraft_id, reason } => {
                    println!("  {} skipped: {}", aircraft_id, reason);
                }
            }
        }

        bridge.publish(&ReportModel::from_summary(&summary))?;
        bridge.publish_status("Offline batch results ready.");

        let report = format!(
            "analyzed={} skipped={} segments={}\n",
            summary.analyzed, summary.skipped, summary.segment_count
        );
        let report_path = PathBuf::from("tools/data/offline_batches.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(report.as_bytes())?;
    }
    if args.serve {
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
