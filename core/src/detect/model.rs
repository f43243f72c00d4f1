use crate::detect::features::FeatureVector;
use crate::math::stats::StatsHelper;
use crate::prelude::{ModelConfig, ModelKind, PipelineError, PipelineResult, ScoreCutoff};
use crate::telemetry::log::LogManager;
use crate::trajectory::AnomalyFlag;
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Unsupervised outlier detector with explicit fit and score phases.
///
/// `fit` returns a caller-owned [`ModelState`]; nothing is cached inside
/// the detector, so two independent trajectories never share a model
/// unless the caller explicitly fits one state over their combined
/// features and passes it to both `score` calls.
pub struct OutlierModel {
    config: ModelConfig,
    logger: LogManager,
}

/// Trained state returned by [`OutlierModel::fit`].
#[derive(Debug, Clone)]
pub enum ModelState {
    Gaussian {
        mean: Array1<f64>,
        std: Array1<f64>,
    },
    Forest {
        trees: Vec<TreeNode>,
        subsample: usize,
    },
}

#[derive(Debug, Clone)]
pub enum TreeNode {
    Split {
        dimension: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        size: usize,
    },
}

impl OutlierModel {
    const FOREST_TREES: usize = 100;
    const FOREST_SUBSAMPLE: usize = 256;

    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            logger: LogManager::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fits the configured model over the feature matrix.
    ///
    /// Fewer than `min_samples` vectors is an insufficient-data failure,
    /// never a silently degraded fit.
    pub fn fit(&self, features: &[FeatureVector]) -> PipelineResult<ModelState> {
        if features.len() < self.config.min_samples {
            return Err(PipelineError::InsufficientData {
                needed: self.config.min_samples,
                got: features.len(),
            });
        }

        let matrix = feature_matrix(features);
        let state = match self.config.kind {
            ModelKind::Gaussian => fit_gaussian(&matrix),
            ModelKind::IsolationForest => fit_forest(
                &matrix,
                Self::FOREST_TREES,
                Self::FOREST_SUBSAMPLE,
                self.config.seed,
            ),
        };
        self.logger.record(&format!(
            "OutlierModel fitted {:?} on {} samples",
            self.config.kind,
            features.len()
        ));
        Ok(state)
    }

    /// Scores each feature vector against a previously fitted state.
    /// Higher means more anomalous. Deterministic for a given state.
    pub fn score(&self, state: &ModelState, features: &[FeatureVector]) -> Vec<f64> {
        match state {
            ModelState::Gaussian { mean, std } => features
                .iter()
                .map(|f| gaussian_score(&f.as_array(), mean, std))
                .collect(),
            ModelState::Forest { trees, subsample } => features
                .iter()
                .map(|f| forest_score(&f.as_array(), trees, *subsample))
                .collect(),
        }
    }

    /// Applies the configured cutoff to the scores and emits model flags.
    pub fn flags(&self, state: &ModelState, features: &[FeatureVector]) -> Vec<AnomalyFlag> {
        let scores = self.score(state, features);
        let threshold = match self.config.cutoff {
            ScoreCutoff::Fixed(value) => value,
            ScoreCutoff::Percentile(p) => StatsHelper::percentile(&scores, p),
        };

        features
            .iter()
            .zip(scores)
            .filter(|(_, score)| *score > threshold)
            .map(|(feature, score)| AnomalyFlag::model(feature.window_index, score))
            .collect()
    }
}

fn feature_matrix(features: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((features.len(), FeatureVector::DIMENSIONS));
    for (row, feature) in features.iter().enumerate() {
        for (col, value) in feature.as_array().into_iter().enumerate() {
            matrix[[row, col]] = value;
        }
    }
    matrix
}

fn fit_gaussian(matrix: &Array2<f64>) -> ModelState {
    let columns = matrix.ncols();
    let mut mean = Array1::zeros(columns);
    let mut std = Array1::zeros(columns);
    for col in 0..columns {
        let values: Vec<f64> = matrix.column(col).to_vec();
        let (m, s) = StatsHelper::mean_std(&values);
        mean[col] = m;
        std[col] = s;
    }
    ModelState::Gaussian { mean, std }
}

/// RMS of the per-dimension z-scores. Degenerate dimensions with zero
/// spread contribute nothing instead of dividing by zero.
fn gaussian_score(values: &[f64; 4], mean: &Array1<f64>, std: &Array1<f64>) -> f64 {
    let mut sum_sq = 0.0;
    for (col, &value) in values.iter().enumerate() {
        if std[col] > 0.0 {
            let z = (value - mean[col]) / std[col];
            sum_sq += z * z;
        }
    }
    (sum_sq / values.len() as f64).sqrt()
}

fn fit_forest(matrix: &Array2<f64>, tree_count: usize, subsample: usize, seed: u64) -> ModelState {
    let rows = matrix.nrows();
    let subsample = subsample.min(rows);
    let height_limit = (subsample as f64).log2().ceil() as usize;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut trees = Vec::with_capacity(tree_count);
    for _ in 0..tree_count {
        let mut indices: Vec<usize> = (0..rows).collect();
        // partial Fisher-Yates: the first `subsample` entries end up a
        // uniform draw without replacement
        for i in 0..subsample {
            let j = rng.gen_range(i..rows);
            indices.swap(i, j);
        }
        indices.truncate(subsample);
        trees.push(build_tree(matrix, &indices, 0, height_limit, &mut rng));
    }

    ModelState::Forest { trees, subsample }
}

fn build_tree(
    matrix: &Array2<f64>,
    indices: &[usize],
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> TreeNode {
    if indices.len() <= 1 || depth >= height_limit {
        return TreeNode::Leaf {
            size: indices.len(),
        };
    }

    let dimension = rng.gen_range(0..matrix.ncols());
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &row in indices {
        let v = matrix[[row, dimension]];
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo >= hi {
        // constant along the chosen dimension, cannot split further
        return TreeNode::Leaf {
            size: indices.len(),
        };
    }

    let threshold = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&row| matrix[[row, dimension]] < threshold);

    TreeNode::Split {
        dimension,
        threshold,
        left: Box::new(build_tree(matrix, &left, depth + 1, height_limit, rng)),
        right: Box::new(build_tree(matrix, &right, depth + 1, height_limit, rng)),
    }
}

/// Average unsuccessful-search path length of a BST with `n` nodes; the
/// standard isolation-forest normalization term.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}

fn path_length(values: &[f64; 4], node: &TreeNode, depth: f64) -> f64 {
    match node {
        TreeNode::Leaf { size } => depth + average_path_length(*size),
        TreeNode::Split {
            dimension,
            threshold,
            left,
            right,
        } => {
            if values[*dimension] < *threshold {
                path_length(values, left, depth + 1.0)
            } else {
                path_length(values, right, depth + 1.0)
            }
        }
    }
}

/// Anomaly score in (0, 1); isolated points approach 1.
fn forest_score(values: &[f64; 4], trees: &[TreeNode], subsample: usize) -> f64 {
    if trees.is_empty() {
        return 0.0;
    }
    let mean_path: f64 = trees
        .iter()
        .map(|tree| path_length(values, tree, 0.0))
        .sum::<f64>()
        / trees.len() as f64;
    let c = average_path_length(subsample).max(f64::MIN_POSITIVE);
    2f64.powf(-mean_path / c)
}
