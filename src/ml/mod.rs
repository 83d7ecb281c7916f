//! Machine learning: preparation, models, training, and evaluation.
//!
//! - imputation, scaling, and splitting (`processor`)
//! - CART regression trees (`tree`) and the ensembles built on them
//!   (`forest`, `boosting`)
//! - the `Regressor` seam over fitted models (`model`)
//! - training, scoring, persistence (`trainer`)
//! - metrics and charts (`evaluation`)

pub mod boosting;
pub mod evaluation;
pub mod forest;
pub mod model;
pub mod processor;
pub mod trainer;
pub mod tree;

pub use evaluation::Evaluator;
pub use model::{FittedModel, Regressor};
pub use processor::{MLDataProcessor, PreparedData, SplitConfig, StandardScaler};
pub use trainer::ModelTrainer;
