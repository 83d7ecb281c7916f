//! Raw team stats JSON (team code → array of player records).
//!
//! Written by `nhl fetch`, read by `nhl process`. Older captures have the
//! fetch log in front of the JSON; everything after the last
//! [`RAW_LOG_MARKER`] line is taken as the payload.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::data::json_kind;
use crate::error::AppError;
use crate::logging::Reporter;

pub const RAW_LOG_MARKER: &str = "Saving complete stats to file...";

/// Write the team map as pretty JSON, creating parent directories.
pub fn write_team_stats(path: &Path, stats: &Map<String, Value>) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create stats file '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, stats)
        .map_err(|e| AppError::io(format!("Failed to write stats file: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write stats file: {e}")))
}

/// Parse file contents, skipping any log text before the marker.
pub fn parse_team_stats(content: &str) -> Result<Map<String, Value>, AppError> {
    let payload = content.rsplit(RAW_LOG_MARKER).next().unwrap_or(content).trim();
    let value: Value =
        serde_json::from_str(payload).map_err(|e| AppError::data(format!("Invalid stats JSON: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::data(format!(
            "Stats JSON must be an object keyed by team, got {}.",
            json_kind(&other)
        ))),
    }
}

pub fn read_team_stats(path: &Path) -> Result<Map<String, Value>, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read stats file '{}': {e}", path.display())))?;
    parse_team_stats(&content)
}

/// Like [`read_team_stats`], but a failure is logged and yields an empty map.
pub fn load_team_stats(path: &Path, reporter: &Arc<dyn Reporter>) -> Map<String, Value> {
    match read_team_stats(path) {
        Ok(map) => map,
        Err(e) => {
            reporter.error(&format!("Error loading JSON file: {e}"));
            Map::new()
        }
    }
}
