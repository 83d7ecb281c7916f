//! Model training, scoring, and persistence.
//!
//! A `ModelTrainer` owns one data processor and, once trained or loaded, one
//! fitted model. The model family is fixed at construction; everything that
//! needs a model returns `NotFitted` until `train` or `load_model` succeeds.

use std::path::Path;

use crate::domain::{FeatureImportance, FeatureTable, ModelKind, TrainMetrics};
use crate::error::AppError;
use crate::io::bundle::{BUNDLE_TOOL, ModelBundle, read_bundle, write_bundle};
use crate::math::{mean_squared_error, r2_score};
use crate::ml::model::{FittedModel, Regressor};
use crate::ml::processor::MLDataProcessor;

const TRAIN_HINT: &str = "Call train() or load_model() first.";

#[derive(Debug, Clone)]
pub struct ModelTrainer {
    kind: ModelKind,
    processor: MLDataProcessor,
    model: Option<FittedModel>,
}

impl ModelTrainer {
    pub fn new(kind: ModelKind) -> Self {
        Self::with_processor(kind, MLDataProcessor::new())
    }

    pub fn with_processor(kind: ModelKind, processor: MLDataProcessor) -> Self {
        Self {
            kind,
            processor,
            model: None,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn processor(&self) -> &MLDataProcessor {
        &self.processor
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Prepare `table`, fit the model on the training split, and score both splits.
    pub fn train(&mut self, table: &FeatureTable, target: &str) -> Result<TrainMetrics, AppError> {
        let mut processor = self.processor.clone();
        let data = processor.prepare_features(table, target)?;

        let y_train: Vec<f64> = data.y_train.iter().copied().collect();
        let y_test: Vec<f64> = data.y_test.iter().copied().collect();
        let model = FittedModel::fit(self.kind, &data.x_train, &y_train)?;

        let train_pred = model.predict(&data.x_train);
        let test_pred = model.predict(&data.x_test);
        let train_mse = mean_squared_error(&y_train, &train_pred);
        let test_mse = mean_squared_error(&y_test, &test_pred);
        let metrics = TrainMetrics {
            train_mse,
            test_mse,
            train_rmse: train_mse.sqrt(),
            test_rmse: test_mse.sqrt(),
            train_r2: r2_score(&y_train, &train_pred),
            test_r2: r2_score(&y_test, &test_pred),
        };

        self.processor = processor;
        self.model = Some(model);
        Ok(metrics)
    }

    /// Score new rows; `table` must contain every recorded feature column.
    pub fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, AppError> {
        let model = self.model()?;
        let x = self.processor.process_new_data(table)?;
        Ok(model.predict(&x))
    }

    /// Importances by feature, highest first; `None` entries (no importances) keep column order.
    pub fn get_feature_importance(&self) -> Result<Vec<FeatureImportance>, AppError> {
        let model = self.model()?;
        let columns = self.processor.feature_columns()?;
        let values = model.feature_importances();

        let mut out: Vec<FeatureImportance> = columns
            .iter()
            .enumerate()
            .map(|(i, feature)| FeatureImportance {
                feature: feature.clone(),
                importance: values.as_ref().and_then(|v| v.get(i).copied()),
            })
            .collect();
        out.sort_by(|a, b| match (a.importance, b.importance) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(out)
    }

    pub fn to_bundle(&self) -> Result<ModelBundle, AppError> {
        let model = self.model()?;
        Ok(ModelBundle {
            tool: BUNDLE_TOOL.to_string(),
            model_kind: model.kind(),
            target_column: self.processor.target_column()?.to_string(),
            feature_columns: self.processor.feature_columns()?.to_vec(),
            scaler: self.processor.scaler()?.clone(),
            model: model.clone(),
        })
    }

    /// Rebuild a trained trainer from a bundle. The family comes from the bundle.
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self, AppError> {
        if bundle.model.n_features() != bundle.feature_columns.len() {
            return Err(AppError::data(format!(
                "Model was fitted on {} features but the bundle lists {}.",
                bundle.model.n_features(),
                bundle.feature_columns.len()
            )));
        }
        let processor = MLDataProcessor::from_fitted(bundle.feature_columns, bundle.target_column, bundle.scaler)?;
        Ok(Self {
            kind: bundle.model_kind,
            processor,
            model: Some(bundle.model),
        })
    }

    pub fn save_model(&self, path: &Path) -> Result<(), AppError> {
        write_bundle(path, &self.to_bundle()?)
    }

    /// Replace this trainer's state with the bundle at `path`.
    pub fn load_model(&mut self, path: &Path) -> Result<(), AppError> {
        *self = Self::load(path)?;
        Ok(())
    }

    /// A trainer restored from the bundle at `path`.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        Self::from_bundle(read_bundle(path)?)
    }

    fn model(&self) -> Result<&FittedModel, AppError> {
        self.model
            .as_ref()
            .ok_or_else(|| AppError::not_fitted("Model", TRAIN_HINT))
    }
}
