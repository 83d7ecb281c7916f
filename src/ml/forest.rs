//! Random forest regressor: bagged CART trees, averaged.
//!
//! Each tree draws its own bootstrap sample from an RNG seeded with
//! `seed + tree_index`, so trees can be grown in parallel and the result is
//! still reproducible.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::ml::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(x: &DMatrix<f64>, y: &[f64], params: ForestParams) -> Result<Self, AppError> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(AppError::data(format!(
                "Cannot fit random forest on {} rows with {} targets",
                n,
                y.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(AppError::usage("Random forest needs at least one tree"));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            feature_seed: None,
        };

        let trees: Vec<RegressionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &rows, &tree_params)
            })
            .collect();

        Ok(Self {
            params,
            n_features: x.ncols(),
            trees,
        })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        let n_trees = self.trees.len().max(1) as f64;
        (0..x.nrows())
            .map(|r| self.trees.iter().map(|t| t.predict_row(x, r)).sum::<f64>() / n_trees)
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-tree normalized impurity decreases. Trees that never
    /// split contribute zeros; `None` only if no tree split at all.
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        let mut sum = vec![0.0; self.n_features];
        let mut any = false;
        for imp in self.trees.iter().filter_map(|t| t.normalized_importances()) {
            any = true;
            for (s, v) in sum.iter_mut().zip(imp) {
                *s += v;
            }
        }
        if !any {
            return None;
        }
        let n_trees = self.trees.len() as f64;
        let mean: Vec<f64> = sum.into_iter().map(|s| s / n_trees).collect();
        let total: f64 = mean.iter().sum();
        Some(mean.into_iter().map(|v| v / total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (DMatrix<f64>, Vec<f64>) {
        // Feature 0 drives the target, feature 1 is noise-free filler.
        let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { i as f64 } else { ((i * 7) % 5) as f64 });
        let y = (0..n).map(|i| 3.0 * i as f64 + 1.0).collect();
        (x, y)
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = linear_data(30);
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&x, &y, params).unwrap();
        let b = RandomForest::fit(&x, &y, params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_trees(), 10);
    }

    #[test]
    fn fits_training_data_closely() {
        let (x, y) = linear_data(40);
        let forest = RandomForest::fit(&x, &y, ForestParams::default()).unwrap();
        let pred = forest.predict(&x);
        let mae = crate::math::mean_absolute_error(&y, &pred);
        assert!(mae < 5.0, "mae {mae}");
    }

    #[test]
    fn importances_favour_the_driving_feature() {
        let (x, y) = linear_data(40);
        let forest = RandomForest::fit(&x, &y, ForestParams::default()).unwrap();
        let imp = forest.feature_importances().unwrap();
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn rejects_empty_input() {
        let x = DMatrix::<f64>::zeros(0, 2);
        assert!(RandomForest::fit(&x, &[], ForestParams::default()).is_err());
    }
}
