pub mod geo;
pub mod stats;

pub use geo::{haversine_nm, heading_delta_deg};
pub use stats::StatsHelper;
