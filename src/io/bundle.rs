//! Read/write model bundle JSON files.
//!
//! A bundle is everything needed to score new rows: the fitted model, the
//! scaler it was trained behind, and the ordered feature columns. It is
//! written to a sibling temp file and renamed so readers never see a partial
//! bundle.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::ml::model::FittedModel;
use crate::ml::processor::StandardScaler;

/// Value of the `tool` field; bundles from anything else are rejected.
pub const BUNDLE_TOOL: &str = "nhl-ml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub tool: String,
    pub model_kind: ModelKind,
    pub target_column: String,
    pub feature_columns: Vec<String>,
    pub scaler: StandardScaler,
    pub model: FittedModel,
}

/// Write `bundle` to `path`, creating parent directories.
pub fn write_bundle(path: &Path, bundle: &ModelBundle) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::io(format!("Failed to create model directory '{}': {e}", parent.display()))
        })?;
    }

    let tmp = temp_path(path);
    let file = File::create(&tmp)
        .map_err(|e| AppError::io(format!("Failed to create model file '{}': {e}", tmp.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, bundle)
        .map_err(|e| AppError::io(format!("Failed to write model bundle: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write model bundle: {e}")))?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        AppError::io(format!("Failed to move model bundle into '{}': {e}", path.display()))
    })
}

/// Read and validate a bundle written by [`write_bundle`].
pub fn read_bundle(path: &Path) -> Result<ModelBundle, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open model file '{}': {e}", path.display())))?;
    let bundle: ModelBundle = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::data(format!("Invalid model bundle '{}': {e}", path.display())))?;

    if bundle.tool != BUNDLE_TOOL {
        return Err(AppError::data(format!(
            "'{}' was written by '{}', not {BUNDLE_TOOL}.",
            path.display(),
            bundle.tool
        )));
    }
    if bundle.model.kind() != bundle.model_kind {
        return Err(AppError::data(format!(
            "Model bundle '{}' declares {:?} but holds {:?}.",
            path.display(),
            bundle.model_kind,
            bundle.model.kind()
        )));
    }
    if bundle.scaler.n_features() != bundle.feature_columns.len() {
        return Err(AppError::data(format!(
            "Model bundle '{}' has {} feature columns but a scaler for {}.",
            path.display(),
            bundle.feature_columns.len(),
            bundle.scaler.n_features()
        )));
    }

    Ok(bundle)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nhl-ml-bundle-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn tiny_bundle() -> ModelBundle {
        let x = DMatrix::from_fn(6, 2, |i, j| (i + j) as f64);
        let y: Vec<f64> = (0..6).map(|i| i as f64).collect();
        ModelBundle {
            tool: BUNDLE_TOOL.to_string(),
            model_kind: ModelKind::GradientBoosting,
            target_column: "points".to_string(),
            feature_columns: vec!["a".to_string(), "b".to_string()],
            scaler: StandardScaler::fit(&x),
            model: FittedModel::fit(ModelKind::GradientBoosting, &x, &y).unwrap(),
        }
    }

    #[test]
    fn write_then_read_creates_dirs_and_leaves_no_temp() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("models").join("m.json");
        let bundle = tiny_bundle();

        write_bundle(&path, &bundle).unwrap();
        assert!(!temp_path(&path).exists());
        assert_eq!(read_bundle(&path).unwrap(), bundle);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn foreign_tool_is_rejected() {
        let dir = scratch_dir("foreign");
        let path = dir.join("m.json");
        let mut bundle = tiny_bundle();
        bundle.tool = "rv".to_string();
        write_bundle(&path, &bundle).unwrap();

        let err = read_bundle(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let dir = scratch_dir("width");
        let path = dir.join("m.json");
        let mut bundle = tiny_bundle();
        bundle.feature_columns.push("c".to_string());
        write_bundle(&path, &bundle).unwrap();

        assert!(read_bundle(&path).is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_bundle(Path::new("/nonexistent/nhl-ml/model.json")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
