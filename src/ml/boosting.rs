//! Gradient boosting regressor with squared-error loss.
//!
//! Starts from the target mean and adds `learning_rate` times a shallow tree
//! fit to the current residuals, `n_estimators` times.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::ml::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    params: BoostingParams,
    n_features: usize,
    init: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn fit(x: &DMatrix<f64>, y: &[f64], params: BoostingParams) -> Result<Self, AppError> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(AppError::data(format!(
                "Cannot fit gradient boosting on {} rows with {} targets",
                n,
                y.len()
            )));
        }
        if params.learning_rate.is_nan() || params.learning_rate <= 0.0 {
            return Err(AppError::usage(format!(
                "Learning rate must be positive, got {}",
                params.learning_rate
            )));
        }

        let init = y.iter().sum::<f64>() / n as f64;
        let mut current = vec![init; n];
        let rows: Vec<usize> = (0..n).collect();
        let mut stages = Vec::with_capacity(params.n_estimators);

        for stage in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            let tree_params = TreeParams {
                max_depth: Some(params.max_depth),
                min_samples_split: params.min_samples_split,
                min_samples_leaf: params.min_samples_leaf,
                feature_seed: Some(params.seed.wrapping_add(stage as u64)),
            };
            let tree = RegressionTree::fit(x, &residuals, &rows, &tree_params);
            for (r, p) in current.iter_mut().enumerate() {
                *p += params.learning_rate * tree.predict_row(x, r);
            }
            stages.push(tree);
        }

        Ok(Self {
            params,
            n_features: x.ncols(),
            init,
            stages,
        })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|r| {
                self.init
                    + self
                        .stages
                        .iter()
                        .map(|t| self.params.learning_rate * t.predict_row(x, r))
                        .sum::<f64>()
            })
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    /// Mean of the per-stage normalized impurity decreases, renormalized.
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        let mut sum = vec![0.0; self.n_features];
        for imp in self.stages.iter().filter_map(|t| t.normalized_importances()) {
            for (s, v) in sum.iter_mut().zip(imp) {
                *s += v;
            }
        }
        let total: f64 = sum.iter().sum();
        (total > 0.0).then(|| sum.into_iter().map(|v| v / total).collect())
    }
}
