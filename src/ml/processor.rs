//! Feature preparation: imputation, standardization, and the train/test split.
//!
//! The processor is a two-state machine. `prepare_features` moves it from
//! unfitted to fitted (recording the feature columns and the scaler);
//! `process_new_data` is only valid once fitted and never refits the scaler.

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::FeatureTable;
use crate::error::AppError;
use crate::math::mean_present;

/// Per-column mean / standard deviation fitted on training features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on the columns of `x`. Constant columns get a scale of 1.
    pub fn fit(x: &DMatrix<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mut means = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());

        for col in x.column_iter() {
            let mean = col.sum() / n;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            means.push(mean);
            scales.push(if std < 10.0 * f64::EPSILON { 1.0 } else { std });
        }

        Self { means, scales }
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        if x.ncols() != self.n_features() {
            return Err(AppError::data(format!(
                "Scaler was fitted on {} features but got {}.",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - self.means[j]) / self.scales[j]
        }))
    }
}

/// How rows are divided between training and evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Scaled features and targets, already split.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: DMatrix<f64>,
    pub x_test: DMatrix<f64>,
    pub y_train: DVector<f64>,
    pub y_test: DVector<f64>,
}

#[derive(Debug, Clone)]
enum ProcessorState {
    Unfitted,
    Fitted {
        feature_columns: Vec<String>,
        target_column: String,
        scaler: StandardScaler,
    },
}

#[derive(Debug, Clone)]
pub struct MLDataProcessor {
    split: SplitConfig,
    state: ProcessorState,
}

impl Default for MLDataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MLDataProcessor {
    pub fn new() -> Self {
        Self::with_split(SplitConfig::default())
    }

    pub fn with_split(split: SplitConfig) -> Self {
        Self {
            split,
            state: ProcessorState::Unfitted,
        }
    }

    /// Restore a processor from a persisted scaler and column list.
    pub fn from_fitted(
        feature_columns: Vec<String>,
        target_column: String,
        scaler: StandardScaler,
    ) -> Result<Self, AppError> {
        if feature_columns.len() != scaler.n_features() {
            return Err(AppError::data(format!(
                "Scaler covers {} features but {} feature columns were recorded.",
                scaler.n_features(),
                feature_columns.len()
            )));
        }
        Ok(Self {
            split: SplitConfig::default(),
            state: ProcessorState::Fitted {
                feature_columns,
                target_column,
                scaler,
            },
        })
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, ProcessorState::Fitted { .. })
    }

    pub fn feature_columns(&self) -> Result<&[String], AppError> {
        match &self.state {
            ProcessorState::Fitted { feature_columns, .. } => Ok(feature_columns),
            ProcessorState::Unfitted => Err(not_fitted()),
        }
    }

    pub fn target_column(&self) -> Result<&str, AppError> {
        match &self.state {
            ProcessorState::Fitted { target_column, .. } => Ok(target_column),
            ProcessorState::Unfitted => Err(not_fitted()),
        }
    }

    pub fn scaler(&self) -> Result<&StandardScaler, AppError> {
        match &self.state {
            ProcessorState::Fitted { scaler, .. } => Ok(scaler),
            ProcessorState::Unfitted => Err(not_fitted()),
        }
    }

    /// Impute, scale, and split `table`; every column but `target` is a feature.
    ///
    /// Rows with a missing target are dropped. Missing feature values are
    /// replaced by the column mean over the (remaining) input rows. The state
    /// only changes when preparation succeeds.
    pub fn prepare_features(
        &mut self,
        table: &FeatureTable,
        target: &str,
    ) -> Result<PreparedData, AppError> {
        let target_idx = table
            .column_index(target)
            .ok_or_else(|| AppError::data(format!("Target column '{target}' not found.")))?;

        let feature_idx: Vec<usize> = (0..table.columns.len()).filter(|&i| i != target_idx).collect();
        if feature_idx.is_empty() {
            return Err(AppError::data("No feature columns besides the target."));
        }
        let feature_columns: Vec<String> = feature_idx.iter().map(|&i| table.columns[i].clone()).collect();

        let rows: Vec<&Vec<Option<f64>>> = table
            .rows
            .iter()
            .filter(|r| r.get(target_idx).copied().flatten().is_some())
            .collect();
        let n = rows.len();
        if n < 2 {
            return Err(AppError::data(format!(
                "Need at least 2 rows with a '{target}' value to split, got {n}."
            )));
        }

        let kept: Vec<Vec<Option<f64>>> = rows
            .iter()
            .map(|r| feature_idx.iter().map(|&i| r.get(i).copied().flatten()).collect())
            .collect();
        let x = impute_with_means(&kept, feature_columns.len());
        let y = DVector::from_iterator(n, rows.iter().map(|r| r[target_idx].unwrap_or_default()));

        let scaler = StandardScaler::fit(&x);
        let x_scaled = scaler.transform(&x)?;

        let (train_idx, test_idx) = split_indices(n, self.split);
        let prepared = PreparedData {
            x_train: x_scaled.select_rows(train_idx.iter()),
            x_test: x_scaled.select_rows(test_idx.iter()),
            y_train: y.select_rows(train_idx.iter()),
            y_test: y.select_rows(test_idx.iter()),
        };

        self.state = ProcessorState::Fitted {
            feature_columns,
            target_column: target.to_string(),
            scaler,
        };
        Ok(prepared)
    }

    /// Scale new rows with the already fitted scaler.
    ///
    /// Missing values are imputed with the means of `table` itself, not the
    /// training means. Extra columns (including the target) are ignored.
    pub fn process_new_data(&self, table: &FeatureTable) -> Result<DMatrix<f64>, AppError> {
        let ProcessorState::Fitted {
            feature_columns,
            scaler,
            ..
        } = &self.state
        else {
            return Err(not_fitted());
        };

        let mut idx = Vec::with_capacity(feature_columns.len());
        for col in feature_columns {
            let i = table
                .column_index(col)
                .ok_or_else(|| AppError::data(format!("New data is missing feature column '{col}'.")))?;
            idx.push(i);
        }

        let selected: Vec<Vec<Option<f64>>> = table
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r.get(i).copied().flatten()).collect())
            .collect();
        let x = impute_with_means(&selected, idx.len());
        scaler.transform(&x)
    }
}

fn not_fitted() -> AppError {
    AppError::not_fitted("Scaler", "Call prepare_features first.")
}

/// Dense matrix with each missing cell replaced by its column mean
/// (0 when the whole column is missing).
fn impute_with_means(rows: &[Vec<Option<f64>>], n_cols: usize) -> DMatrix<f64> {
    let means: Vec<f64> = (0..n_cols)
        .map(|j| {
            let col: Vec<Option<f64>> = rows.iter().map(|r| r[j]).collect();
            mean_present(&col).unwrap_or(0.0)
        })
        .collect();

    DMatrix::from_fn(rows.len(), n_cols, |i, j| rows[i][j].unwrap_or(means[j]))
}

/// Seeded shuffle; the first `ceil(n * test_fraction)` indices are the test set.
fn split_indices(n: usize, split: SplitConfig) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n as f64) * split.test_fraction).ceil() as usize;
    let n_test = n_test.clamp(1, n.saturating_sub(1).max(1));

    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(&mut StdRng::seed_from_u64(split.seed));

    let test = perm[..n_test].to_vec();
    let train = perm[n_test..].to_vec();
    (train, test)
}
