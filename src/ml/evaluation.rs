//! Prediction accuracy and diagnostic charts.
//!
//! `evaluate` stores the actual/predicted pair and its metrics; every chart
//! and summary reads that stored state and fails with `NotFitted` until it
//! exists.

use std::path::Path;

use crate::domain::{EvalMetrics, FeatureImportance, PredictionRow};
use crate::error::AppError;
use crate::math::{explained_variance, mean_absolute_error, mean_squared_error, r2_score};
use crate::plot::{ReferenceLine, ScatterChart, render_bars, render_scatter, write_bar_svg, write_scatter_svg};

const EVALUATE_HINT: &str = "Call evaluate() first.";

#[derive(Debug, Clone)]
struct Evaluation {
    actual: Vec<f64>,
    predicted: Vec<f64>,
    metrics: EvalMetrics,
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    last: Option<Evaluation>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute and keep the metrics for `predicted` against `actual`.
    pub fn evaluate(&mut self, actual: &[f64], predicted: &[f64]) -> Result<EvalMetrics, AppError> {
        if actual.len() != predicted.len() {
            return Err(AppError::data(format!(
                "Got {} actual values but {} predictions.",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(AppError::data("Nothing to evaluate: no predictions."));
        }

        let mse = mean_squared_error(actual, predicted);
        let metrics = EvalMetrics {
            mse,
            rmse: mse.sqrt(),
            mae: mean_absolute_error(actual, predicted),
            r2: r2_score(actual, predicted),
            explained_variance: explained_variance(actual, predicted),
        };

        self.last = Some(Evaluation {
            actual: actual.to_vec(),
            predicted: predicted.to_vec(),
            metrics,
        });
        Ok(metrics)
    }

    pub fn metrics(&self) -> Result<EvalMetrics, AppError> {
        self.evaluation().map(|e| e.metrics)
    }

    /// One row per prediction, in input order.
    pub fn prediction_summary(&self) -> Result<Vec<PredictionRow>, AppError> {
        let e = self.evaluation()?;
        Ok(e.actual
            .iter()
            .zip(&e.predicted)
            .map(|(&actual, &predicted)| PredictionRow {
                actual,
                predicted,
                residual: actual - predicted,
                abs_error: (actual - predicted).abs(),
            })
            .collect())
    }

    pub fn plot_predictions(&self, path: &Path) -> Result<(), AppError> {
        let points = self.actual_vs_predicted()?;
        write_scatter_svg(
            path,
            &ScatterChart {
                title: "Actual vs Predicted Points",
                x_label: "Actual",
                y_label: "Predicted",
                points: &points,
                reference: ReferenceLine::Diagonal,
            },
        )
    }

    pub fn plot_residuals(&self, path: &Path) -> Result<(), AppError> {
        let points = self.residual_points()?;
        write_scatter_svg(
            path,
            &ScatterChart {
                title: "Residual Plot",
                x_label: "Predicted",
                y_label: "Residual",
                points: &points,
                reference: ReferenceLine::Zero,
            },
        )
    }

    /// Bar chart of the `top_n` most important features.
    pub fn plot_feature_importance(
        &self,
        importances: &[FeatureImportance],
        top_n: usize,
        path: &Path,
    ) -> Result<(), AppError> {
        self.evaluation()?;
        let bars = importance_bars(importances, top_n)?;
        write_bar_svg(path, "Feature Importance", &bars)
    }

    pub fn render_predictions(&self, width: usize, height: usize) -> Result<String, AppError> {
        Ok(render_scatter(&self.actual_vs_predicted()?, ReferenceLine::Diagonal, width, height))
    }

    pub fn render_residuals(&self, width: usize, height: usize) -> Result<String, AppError> {
        Ok(render_scatter(&self.residual_points()?, ReferenceLine::Zero, width, height))
    }

    pub fn render_feature_importance(
        &self,
        importances: &[FeatureImportance],
        top_n: usize,
        width: usize,
    ) -> Result<String, AppError> {
        self.evaluation()?;
        Ok(render_bars(&importance_bars(importances, top_n)?, width))
    }

    fn evaluation(&self) -> Result<&Evaluation, AppError> {
        self.last
            .as_ref()
            .ok_or_else(|| AppError::not_fitted("Evaluator", EVALUATE_HINT))
    }

    fn actual_vs_predicted(&self) -> Result<Vec<(f64, f64)>, AppError> {
        let e = self.evaluation()?;
        Ok(e.actual.iter().copied().zip(e.predicted.iter().copied()).collect())
    }

    fn residual_points(&self) -> Result<Vec<(f64, f64)>, AppError> {
        let e = self.evaluation()?;
        Ok(e.actual.iter().zip(&e.predicted).map(|(a, p)| (*p, a - p)).collect())
    }
}

/// The `top_n` largest importances, highest first; entries without a value are skipped.
fn importance_bars(importances: &[FeatureImportance], top_n: usize) -> Result<Vec<(String, f64)>, AppError> {
    let mut bars: Vec<(String, f64)> = importances
        .iter()
        .filter_map(|f| f.importance.map(|v| (f.feature.clone(), v)))
        .collect();
    bars.sort_by(|a, b| b.1.total_cmp(&a.1));
    bars.truncate(top_n);
    if bars.is_empty() {
        return Err(AppError::data("The model does not expose feature importances."));
    }
    Ok(bars)
}
