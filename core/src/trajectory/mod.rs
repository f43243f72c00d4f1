pub mod anomaly;
pub mod point;

pub use anomaly::{AnomalyFlag, AnomalySegment, FlagSource};
pub use point::{group_rows, RawRow, Trajectory, TrajectoryPoint};
