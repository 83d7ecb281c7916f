//! CART regression tree (squared-error criterion).
//!
//! Trees are grown on a list of row indices into a shared feature matrix, so
//! bootstrap samples are just index lists with repeats. Nodes live in a flat
//! arena; node 0 is the root.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Two feature values closer than this are treated as equal (no threshold between them).
const FEATURE_EPS: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// When set, features are scanned in a seeded random order at each node,
    /// which decides ties between equally good splits.
    pub feature_seed: Option<u64>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            feature_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Total squared-error reduction credited to each feature (unnormalized).
    impurity_decrease: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Grower<'a> {
    x: &'a DMatrix<f64>,
    y: &'a [f64],
    params: &'a TreeParams,
    rng: Option<StdRng>,
    nodes: Vec<Node>,
    impurity_decrease: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on `rows` of `x` / `y`. An empty `rows` yields a single 0 leaf.
    pub fn fit(x: &DMatrix<f64>, y: &[f64], rows: &[usize], params: &TreeParams) -> Self {
        let mut grower = Grower {
            x,
            y,
            params,
            rng: params.feature_seed.map(StdRng::seed_from_u64),
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; x.ncols()],
        };
        grower.grow(rows.to_vec(), 0);

        Self {
            nodes: grower.nodes,
            impurity_decrease: grower.impurity_decrease,
        }
    }

    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if x[(row, *feature)] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows()).map(|r| self.predict_row(x, r)).collect()
    }

    /// Impurity decrease scaled to sum to 1; `None` for a tree with no splits.
    pub fn normalized_importances(&self) -> Option<Vec<f64>> {
        let total: f64 = self.impurity_decrease.iter().sum();
        (total > 0.0).then(|| self.impurity_decrease.iter().map(|v| v / total).collect())
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Grower<'_> {
    /// Grow the subtree for `rows`, returning its node index.
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let idx = self.nodes.len();
        let value = self.mean(&rows);
        self.nodes.push(Node::Leaf { value });

        if !self.can_split(&rows, depth) {
            return idx;
        }
        let Some(best) = self.best_split(&rows) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.x[(r, best.feature)] <= best.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return idx;
        }

        self.impurity_decrease[best.feature] += best.gain;
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn can_split(&self, rows: &[usize], depth: usize) -> bool {
        let n = rows.len();
        if self.params.max_depth.is_some_and(|d| depth >= d) {
            return false;
        }
        if n < self.params.min_samples_split.max(2) || n < 2 * self.params.min_samples_leaf.max(1) {
            return false;
        }
        self.sse(rows) > 1e-12
    }

    fn best_split(&mut self, rows: &[usize]) -> Option<BestSplit> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total_sum: f64 = rows.iter().map(|&r| self.y[r]).sum();
        let total_sq: f64 = rows.iter().map(|&r| self.y[r] * self.y[r]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        if let Some(rng) = self.rng.as_mut() {
            features.shuffle(rng);
        }

        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();

        for feature in features {
            sorted.sort_by(|&a, &b| self.x[(a, feature)].total_cmp(&self.x[(b, feature)]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for i in 1..n {
                let prev = sorted[i - 1];
                left_sum += self.y[prev];
                left_sq += self.y[prev] * self.y[prev];

                if i < min_leaf || n - i < min_leaf {
                    continue;
                }
                let lo = self.x[(prev, feature)];
                let hi = self.x[(sorted[i], feature)];
                if hi <= lo + FEATURE_EPS {
                    continue;
                }

                let n_left = i as f64;
                let n_right = (n - i) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let child_sse = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);
                let gain = parent_sse - child_sse;

                if gain > best.map_or(1e-12, |b| b.gain) {
                    let mut threshold = (lo + hi) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    fn mean(&self, rows: &[usize]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        rows.iter().map(|&r| self.y[r]).sum::<f64>() / rows.len() as f64
    }

    fn sse(&self, rows: &[usize]) -> f64 {
        let m = self.mean(rows);
        rows.iter().map(|&r| (self.y[r] - m).powi(2)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (DMatrix<f64>, Vec<f64>) {
        // y depends on feature 1 only: a step at x1 = 5.
        let n = 10;
        let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { (i % 3) as f64 } else { i as f64 });
        let y = (0..n).map(|i| if i < 5 { 1.0 } else { 10.0 }).collect();
        (x, y)
    }

    #[test]
    fn learns_a_step_with_one_split() {
        let (x, y) = step_data();
        let rows: Vec<usize> = (0..10).collect();
        let tree = RegressionTree::fit(&x, &y, &rows, &TreeParams::default());

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&x), y);
        assert_eq!(tree.normalized_importances(), Some(vec![0.0, 1.0]));
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = DMatrix::from_fn(8, 1, |i, _| i as f64);
        let y: Vec<f64> = (0..8).map(|i| (i * i) as f64).collect();
        let rows: Vec<usize> = (0..8).collect();

        let params = TreeParams {
            max_depth: Some(2),
            ..TreeParams::default()
        };
        let shallow = RegressionTree::fit(&x, &y, &rows, &params);
        assert!(shallow.depth() <= 2);
        assert!(shallow.n_leaves() <= 4);

        let full = RegressionTree::fit(&x, &y, &rows, &TreeParams::default());
        assert_eq!(full.n_leaves(), 8);
        assert_eq!(full.predict(&x), y);
    }

    #[test]
    fn constant_target_is_a_single_leaf() {
        let x = DMatrix::from_fn(5, 2, |i, j| (i + j) as f64);
        let y = vec![3.0; 5];
        let rows: Vec<usize> = (0..5).collect();
        let tree = RegressionTree::fit(&x, &y, &rows, &TreeParams::default());

        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.normalized_importances(), None);
        assert_eq!(tree.predict_row(&x, 2), 3.0);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x = DMatrix::from_fn(6, 1, |i, _| i as f64);
        let y = vec![0.0, 0.0, 0.0, 0.0, 0.0, 100.0];
        let rows: Vec<usize> = (0..6).collect();
        let params = TreeParams {
            min_samples_leaf: 2,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&x, &y, &rows, &params);
        // The outlier can't sit alone in a leaf.
        assert!(tree.predict_row(&x, 5) < 100.0);
    }

    #[test]
    fn bootstrap_rows_with_repeats() {
        let (x, y) = step_data();
        let rows = vec![0, 0, 1, 7, 7, 9];
        let tree = RegressionTree::fit(&x, &y, &rows, &TreeParams::default());
        assert_eq!(tree.predict_row(&x, 0), 1.0);
        assert_eq!(tree.predict_row(&x, 8), 10.0);
    }
}
