//! The fitted-model seam shared by the trainer and the bundle format.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::ml::boosting::{BoostingParams, GradientBoosting};
use crate::ml::forest::{ForestParams, RandomForest};

/// A fitted regression model over a fixed number of scaled features.
pub trait Regressor {
    fn predict(&self, x: &DMatrix<f64>) -> Vec<f64>;

    fn n_features(&self) -> usize;

    /// Per-feature importances in column order, if the model has any.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

impl Regressor for RandomForest {
    fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        RandomForest::predict(self, x)
    }

    fn n_features(&self) -> usize {
        RandomForest::n_features(self)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        RandomForest::feature_importances(self)
    }
}

impl Regressor for GradientBoosting {
    fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        GradientBoosting::predict(self, x)
    }

    fn n_features(&self) -> usize {
        GradientBoosting::n_features(self)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        GradientBoosting::feature_importances(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedModel {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl FittedModel {
    /// Fit `kind` with its fixed hyperparameters.
    pub fn fit(kind: ModelKind, x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        match kind {
            ModelKind::RandomForest => {
                RandomForest::fit(x, y, ForestParams::default()).map(FittedModel::RandomForest)
            }
            ModelKind::GradientBoosting => {
                GradientBoosting::fit(x, y, BoostingParams::default()).map(FittedModel::GradientBoosting)
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::RandomForest(_) => ModelKind::RandomForest,
            FittedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            FittedModel::RandomForest(m) => m,
            FittedModel::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for FittedModel {
    fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        self.inner().predict(x)
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.inner().feature_importances()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MeanOnly(f64);

    impl Regressor for MeanOnly {
        fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
            vec![self.0; x.nrows()]
        }

        fn n_features(&self) -> usize {
            0
        }
    }

    #[test]
    fn default_importances_are_absent() {
        assert_eq!(MeanOnly(1.0).feature_importances(), None);
    }

    #[test]
    fn fitted_model_reports_its_kind() {
        let x = DMatrix::from_fn(12, 2, |i, j| (i * (j + 1)) as f64);
        let y: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let model = FittedModel::fit(ModelKind::GradientBoosting, &x, &y).unwrap();
        assert_eq!(model.kind(), ModelKind::GradientBoosting);
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.predict(&x).len(), 12);
    }

    #[test]
    fn serde_tag_names_the_family() {
        let x = DMatrix::from_fn(6, 1, |i, _| i as f64);
        let y: Vec<f64> = (0..6).map(|i| 2.0 * i as f64).collect();
        let model = FittedModel::fit(ModelKind::RandomForest, &x, &y).unwrap();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["kind"], "random_forest");
        let back: FittedModel = serde_json::from_value(json).unwrap();
        assert_eq!(back.predict(&x), model.predict(&x));
    }
}
