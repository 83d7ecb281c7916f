//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - produced by the extractor and assembler
//! - written to / read from the dataset CSV and model bundle
//! - fed to the ML processor as a numeric table

use std::collections::HashMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Base URL of the public NHL web API.
pub const API_BASE: &str = "https://api-web.nhle.com/v1";

/// Advisory environment variable; checked for presence only.
pub const API_KEY_ENV: &str = "NHL_API_KEY";

pub const DEFAULT_SEASON: &str = "20232024";

/// Year ages are computed against unless configured otherwise.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2024;

/// Model family trained by `ModelTrainer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::RandomForest => "Random forest",
            ModelKind::GradientBoosting => "Gradient boosting",
        }
    }
}

/// Regular-season counting stats, either current season or career.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CountingStats {
    pub games_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub points: i64,
    pub plus_minus: i64,
    pub pim: i64,
    pub shots: i64,
    pub shooting_pct: f64,
    pub powerplay_goals: i64,
    pub powerplay_points: i64,
}

/// Flat, per-player feature row.
///
/// Per-game rates are zero whenever `season.games_played` is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub player_id: Option<i64>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub name: String,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub season: CountingStats,
    pub career: CountingStats,
    pub goals_per_game: f64,
    pub points_per_game: f64,
    pub shots_per_game: f64,
}

impl FeatureRecord {
    /// Column order used by the dataset CSV.
    pub const COLUMNS: [&'static str; 30] = [
        "player_id",
        "team",
        "position",
        "name",
        "age",
        "height_cm",
        "weight_kg",
        "games_played",
        "goals",
        "assists",
        "points",
        "plus_minus",
        "pim",
        "shots",
        "shooting_pct",
        "powerplay_goals",
        "powerplay_points",
        "career_games",
        "career_goals",
        "career_assists",
        "career_points",
        "career_plus_minus",
        "career_pim",
        "career_shots",
        "career_shooting_pct",
        "career_powerplay_goals",
        "career_powerplay_points",
        "goals_per_game",
        "points_per_game",
        "shots_per_game",
    ];

    /// Text-valued columns; everything else in `COLUMNS` is numeric.
    pub const TEXT_COLUMNS: [&'static str; 3] = ["team", "position", "name"];

    /// Numeric value of `column`.
    ///
    /// Outer `None` means the column is unknown or not numeric; inner `None`
    /// means the value is missing for this player.
    pub fn numeric(&self, column: &str) -> Option<Option<f64>> {
        let s = &self.season;
        let c = &self.career;
        let v = match column {
            "player_id" => self.player_id.map(|v| v as f64),
            "age" => self.age.map(f64::from),
            "height_cm" => self.height_cm,
            "weight_kg" => self.weight_kg,
            "games_played" => Some(s.games_played as f64),
            "goals" => Some(s.goals as f64),
            "assists" => Some(s.assists as f64),
            "points" => Some(s.points as f64),
            "plus_minus" => Some(s.plus_minus as f64),
            "pim" => Some(s.pim as f64),
            "shots" => Some(s.shots as f64),
            "shooting_pct" => Some(s.shooting_pct),
            "powerplay_goals" => Some(s.powerplay_goals as f64),
            "powerplay_points" => Some(s.powerplay_points as f64),
            "career_games" => Some(c.games_played as f64),
            "career_goals" => Some(c.goals as f64),
            "career_assists" => Some(c.assists as f64),
            "career_points" => Some(c.points as f64),
            "career_plus_minus" => Some(c.plus_minus as f64),
            "career_pim" => Some(c.pim as f64),
            "career_shots" => Some(c.shots as f64),
            "career_shooting_pct" => Some(c.shooting_pct),
            "career_powerplay_goals" => Some(c.powerplay_goals as f64),
            "career_powerplay_points" => Some(c.powerplay_points as f64),
            "goals_per_game" => Some(self.goals_per_game),
            "points_per_game" => Some(self.points_per_game),
            "shots_per_game" => Some(self.shots_per_game),
            _ => return None,
        };
        Some(v)
    }

    /// Text value of a `TEXT_COLUMNS` entry.
    pub fn text(&self, column: &str) -> Option<&str> {
        match column {
            "team" => self.team.as_deref(),
            "position" => self.position.as_deref(),
            "name" => Some(self.name.as_str()),
            _ => None,
        }
    }
}

/// Ordered, de-duplicated player rows restricted to the teams of interest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<FeatureRecord>,
}

impl Dataset {
    pub fn new(records: Vec<FeatureRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Build a numeric table from the named columns.
    pub fn numeric_table(&self, columns: &[&str]) -> Result<FeatureTable, AppError> {
        for &col in columns {
            if FeatureRecord::default().numeric(col).is_none() {
                return Err(AppError::data(format!("Unknown numeric column '{col}'.")));
            }
        }

        let mut table = FeatureTable::new(columns.iter().map(|c| c.to_string()).collect());
        for record in &self.records {
            let row = columns
                .iter()
                .map(|&col| record.numeric(col).flatten())
                .collect();
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Occurrences of each value of a text column, most frequent first.
    pub fn value_counts(&self, column: &str) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in &self.records {
            let key = record.text(column).unwrap_or("").to_string();
            *counts.entry(key).or_default() += 1;
        }
        let mut out: Vec<(String, usize)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Top `n` players by current-season points (stable for ties).
    pub fn top_by_points(&self, n: usize) -> Vec<&FeatureRecord> {
        let mut sorted: Vec<&FeatureRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.season.points.cmp(&a.season.points));
        sorted.truncate(n);
        sorted
    }
}

/// Numeric table with optional (missing) cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, in row order.
    pub fn column(&self, idx: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(idx).copied().flatten()).collect()
    }

    /// Keep only the rows at `indices` (in that order).
    pub fn select_rows(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            columns: self.columns.clone(),
            rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
        }
    }
}

/// In-sample and out-of-sample error from `ModelTrainer::train`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainMetrics {
    pub train_mse: f64,
    pub test_mse: f64,
    pub train_rmse: f64,
    pub test_rmse: f64,
    pub train_r2: f64,
    pub test_r2: f64,
}

impl TrainMetrics {
    pub fn pairs(&self) -> [(&'static str, f64); 6] {
        [
            ("train_mse", self.train_mse),
            ("test_mse", self.test_mse),
            ("train_rmse", self.train_rmse),
            ("test_rmse", self.test_rmse),
            ("train_r2", self.train_r2),
            ("test_r2", self.test_r2),
        ]
    }
}

/// Accuracy of a set of predictions against ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub explained_variance: f64,
}

impl EvalMetrics {
    pub fn pairs(&self) -> [(&'static str, f64); 5] {
        [
            ("mse", self.mse),
            ("rmse", self.rmse),
            ("mae", self.mae),
            ("r2", self.r2),
            ("explained_variance", self.explained_variance),
        ]
    }
}

/// One feature's importance; `None` when the model exposes none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRow {
    pub actual: f64,
    pub predicted: f64,
    pub residual: f64,
    pub abs_error: f64,
}

/// Condensed team info from the club-stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_id: u32,
    pub name: String,
    pub games_played: i64,
    pub points: i64,
    pub goals_for: i64,
    pub goals_against: i64,
}

/// `nhl fetch` settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub teams: Vec<String>,
    pub output: PathBuf,
}

/// `nhl process` settings.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub teams_of_interest: Vec<String>,
    pub reference_year: i32,
}

/// `nhl train` settings.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data: PathBuf,
    pub model_kind: ModelKind,
    pub target: String,
    pub output: PathBuf,
    pub top_n: usize,
}

/// `nhl predict` settings.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub model: PathBuf,
    pub data: PathBuf,
    pub min_games: i64,
    pub sample: usize,
    pub seed: u64,
    pub plots_dir: Option<PathBuf>,
    pub plot_width: usize,
    pub plot_height: usize,
}

/// `nhl team` settings.
#[derive(Debug, Clone)]
pub struct TeamConfig {
    pub base_url: String,
    pub team: String,
    pub season: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, team: &str, points: i64) -> FeatureRecord {
        FeatureRecord {
            player_id: Some(id),
            team: Some(team.to_string()),
            season: CountingStats {
                points,
                ..CountingStats::default()
            },
            ..FeatureRecord::default()
        }
    }

    #[test]
    fn every_non_text_column_is_numeric() {
        let r = FeatureRecord::default();
        for col in FeatureRecord::COLUMNS {
            let is_text = FeatureRecord::TEXT_COLUMNS.contains(&col);
            assert_eq!(r.numeric(col).is_some(), !is_text, "column {col}");
        }
    }

    #[test]
    fn numeric_table_keeps_missing_cells() {
        let mut a = record(1, "TOR", 10);
        a.age = Some(30);
        let b = record(2, "FLA", 20);
        let ds = Dataset::new(vec![a, b]);

        let table = ds.numeric_table(&["age", "points"]).unwrap();
        assert_eq!(table.columns, vec!["age", "points"]);
        assert_eq!(table.rows[0], vec![Some(30.0), Some(10.0)]);
        assert_eq!(table.rows[1], vec![None, Some(20.0)]);
    }

    #[test]
    fn numeric_table_rejects_text_columns() {
        let ds = Dataset::new(vec![record(1, "TOR", 1)]);
        assert!(ds.numeric_table(&["team"]).is_err());
    }

    #[test]
    fn value_counts_and_top_points() {
        let ds = Dataset::new(vec![
            record(1, "TOR", 10),
            record(2, "FLA", 30),
            record(3, "TOR", 20),
        ]);
        assert_eq!(
            ds.value_counts("team"),
            vec![("TOR".to_string(), 2), ("FLA".to_string(), 1)]
        );
        let top: Vec<i64> = ds.top_by_points(2).iter().filter_map(|r| r.player_id).collect();
        assert_eq!(top, vec![2, 3]);
    }
}
