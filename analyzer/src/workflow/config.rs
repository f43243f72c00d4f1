use crate::generator::tracks::GeneratorConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trajcore::prelude::PipelineConfig;

/// Full run configuration: generator settings plus the pipeline surface
/// passed down into the core.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub generator: GeneratorConfig,
    pub pipeline: PipelineConfig,
}

impl RunConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading run config {}", path_ref.display()))?;
        let config: RunConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing run config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(flights: usize, points: usize, seed: u64) -> Self {
        Self {
            generator: GeneratorConfig {
                flights,
                points,
                seed,
                ..Default::default()
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_default_pipeline() {
        let cfg = RunConfig::from_args(4, 60, 9);
        assert_eq!(cfg.generator.flights, 4);
        assert_eq!(cfg.pipeline.model.min_samples, 30);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"generator:\n  flights: 3\n  points: 80\npipeline:\n  adjacency_gap: 2\n  thresholds:\n    max_speed_delta: 75.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = RunConfig::load(&path).unwrap();
        assert_eq!(cfg.generator.flights, 3);
        assert_eq!(cfg.pipeline.adjacency_gap, 2);
        assert_eq!(cfg.pipeline.thresholds.max_speed_delta, 75.0);
        // untouched fields keep their defaults
        assert_eq!(cfg.pipeline.thresholds.max_heading_delta, 45.0);
    }
}
