//! Column selection for the point-prediction model.

use crate::domain::{Dataset, FeatureTable};
use crate::error::AppError;

/// Season total the model predicts.
pub const POINT_TARGET: &str = "points";

/// Inputs used to predict `POINT_TARGET`.
pub const POINT_FEATURES: [&str; 17] = [
    "age",
    "height_cm",
    "weight_kg",
    "games_played",
    "shots",
    "shooting_pct",
    "powerplay_goals",
    "career_games",
    "career_goals",
    "career_assists",
    "career_points",
    "career_plus_minus",
    "career_shots",
    "career_shooting_pct",
    "career_powerplay_goals",
    "goals_per_game",
    "shots_per_game",
];

/// Non-goalies with at least `min_games` games this season (`min_games`
/// below 1 is treated as 1).
pub fn skaters(dataset: &Dataset, min_games: i64) -> Dataset {
    let min_games = min_games.max(1);
    Dataset::new(
        dataset
            .records
            .iter()
            .filter(|r| r.position.as_deref() != Some("G"))
            .filter(|r| r.season.games_played >= min_games)
            .cloned()
            .collect(),
    )
}

/// Skater rows as `POINT_FEATURES` followed by the target column.
pub fn point_prediction_table(dataset: &Dataset) -> Result<FeatureTable, AppError> {
    prediction_table(dataset, POINT_TARGET)
}

/// Like [`point_prediction_table`] for any numeric target; a target that is
/// itself one of `POINT_FEATURES` is not used as an input.
pub fn prediction_table(dataset: &Dataset, target: &str) -> Result<FeatureTable, AppError> {
    let mut columns: Vec<&str> = POINT_FEATURES.iter().copied().filter(|c| *c != target).collect();
    columns.push(target);
    skaters(dataset, 1).numeric_table(&columns)
}
