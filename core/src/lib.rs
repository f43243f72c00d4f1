//! Anomaly-detection core for historical aircraft trajectory data.
//!
//! The modules form a strict pipeline over batches of trajectory points:
//! feature extraction, rule-based and statistical outlier detection, and
//! aggregation of flags into contiguous anomaly segments. Ingestion and
//! reporting live outside this crate; anything able to produce tabular
//! rows can feed it, and the emitted segment reports are plain serde
//! records for downstream consumers.

pub mod detect;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod telemetry;
pub mod trajectory;

pub use prelude::{Detector, PipelineConfig, PipelineError, PipelineResult};
