pub mod aggregate;
pub mod features;
pub mod model;
pub mod rules;

pub use aggregate::Aggregator;
pub use features::{extract_features, FeatureVector};
pub use model::{ModelState, OutlierModel};
pub use rules::RuleDetector;
