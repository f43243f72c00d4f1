pub mod batch;
pub mod pass;

pub use batch::{BatchRunner, TrajectoryOutcome};
pub use pass::{DetectionPass, ModelSource, TrajectoryReport};
