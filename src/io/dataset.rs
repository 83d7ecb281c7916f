//! Processed dataset CSV (one row per player, `FeatureRecord::COLUMNS` order).
//!
//! Missing optional values are written as empty cells. Reading skips rows
//! without a `player_id` or `team`, the same rule the assembler applies.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{CountingStats, Dataset, FeatureRecord};
use crate::error::AppError;

/// File name used inside the `process` output directory.
pub const DATASET_FILE_NAME: &str = "processed_player_stats.csv";

pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create dataset CSV '{}': {e}", path.display())))?;

    writer
        .write_record(FeatureRecord::COLUMNS)
        .map_err(|e| AppError::io(format!("Failed to write dataset CSV header: {e}")))?;
    for record in &dataset.records {
        let row: Vec<String> = FeatureRecord::COLUMNS.iter().map(|c| cell(record, c)).collect();
        writer
            .write_record(&row)
            .map_err(|e| AppError::io(format!("Failed to write dataset CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write dataset CSV: {e}")))?;
    Ok(())
}

pub fn read_dataset_csv(path: &Path) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppError::io(format!("Failed to open dataset CSV '{}': {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::data(format!("Failed to read dataset CSV headers: {e}")))?
        .clone();
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), idx))
        .collect();
    for required in ["player_id", "team"] {
        if !header_map.contains_key(required) {
            return Err(AppError::data(format!("Missing required column: `{required}`")));
        }
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = result.map_err(|e| AppError::data(format!("CSV parse error on line {line}: {e}")))?;
        let row = Row {
            record: &record,
            header_map: &header_map,
            line,
        };
        if let Some(parsed) = row.feature_record()? {
            records.push(parsed);
        }
    }

    Ok(Dataset::new(records))
}

fn cell(record: &FeatureRecord, column: &str) -> String {
    if FeatureRecord::TEXT_COLUMNS.contains(&column) {
        return record.text(column).unwrap_or_default().to_string();
    }
    record
        .numeric(column)
        .flatten()
        .map(|v| v.to_string())
        .unwrap_or_default()
}

struct Row<'a> {
    record: &'a StringRecord,
    header_map: &'a HashMap<String, usize>,
    line: usize,
}

impl Row<'_> {
    fn feature_record(&self) -> Result<Option<FeatureRecord>, AppError> {
        let (Some(player_id), Some(team)) = (self.int("player_id")?, self.text("team")) else {
            return Ok(None);
        };

        Ok(Some(FeatureRecord {
            player_id: Some(player_id),
            team: Some(team),
            position: self.text("position"),
            name: self.text("name").unwrap_or_default(),
            age: self.int("age")?.map(|v| v as i32),
            height_cm: self.float("height_cm")?,
            weight_kg: self.float("weight_kg")?,
            season: self.counting(false)?,
            career: self.counting(true)?,
            goals_per_game: self.float("goals_per_game")?.unwrap_or_default(),
            points_per_game: self.float("points_per_game")?.unwrap_or_default(),
            shots_per_game: self.float("shots_per_game")?.unwrap_or_default(),
        }))
    }

    fn counting(&self, career: bool) -> Result<CountingStats, AppError> {
        let key = |base: &str| match (career, base) {
            (false, _) => base.to_string(),
            (true, "games_played") => "career_games".to_string(),
            (true, _) => format!("career_{base}"),
        };
        let int = |base: &str| -> Result<i64, AppError> { Ok(self.int(&key(base))?.unwrap_or_default()) };

        Ok(CountingStats {
            games_played: int("games_played")?,
            goals: int("goals")?,
            assists: int("assists")?,
            points: int("points")?,
            plus_minus: int("plus_minus")?,
            pim: int("pim")?,
            shots: int("shots")?,
            shooting_pct: self.float(&key("shooting_pct"))?.unwrap_or_default(),
            powerplay_goals: int("powerplay_goals")?,
            powerplay_points: int("powerplay_points")?,
        })
    }

    fn raw(&self, column: &str) -> Option<&str> {
        self.header_map
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn text(&self, column: &str) -> Option<String> {
        self.raw(column).map(str::to_string)
    }

    fn float(&self, column: &str) -> Result<Option<f64>, AppError> {
        self.raw(column)
            .map(|s| {
                s.parse::<f64>().map_err(|_| {
                    AppError::data(format!("Line {}: `{column}` is not a number: '{s}'", self.line))
                })
            })
            .transpose()
    }

    /// Accepts `30` as well as `30.0`.
    fn int(&self, column: &str) -> Result<Option<i64>, AppError> {
        let Some(s) = self.raw(column) else {
            return Ok(None);
        };
        if let Ok(v) = s.parse::<i64>() {
            return Ok(Some(v));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v.round() as i64)),
            _ => Err(AppError::data(format!(
                "Line {}: `{column}` is not an integer: '{s}'",
                self.line
            ))),
        }
    }
}
