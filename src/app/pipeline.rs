//! Shared workflows behind the CLI subcommands.
//!
//! fetch -> raw JSON -> process -> dataset CSV -> train -> model bundle -> predict
//!
//! Each step returns its computed outputs; `app` decides what to print.

use std::path::PathBuf;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{Map, Value};

use crate::data::{StatsClient, team_by_abbrev};
use crate::domain::{
    Dataset, EvalMetrics, FeatureImportance, FetchConfig, PredictConfig, PredictionRow, ProcessConfig,
    TeamConfig, TeamSummary, TrainConfig, TrainMetrics,
};
use crate::error::AppError;
use crate::features::{DatasetAssembler, FeatureExtractor, prediction_table, skaters};
use crate::io::{DATASET_FILE_NAME, RAW_LOG_MARKER};
use crate::logging::Reporter;
use crate::ml::{Evaluator, ModelTrainer};

#[derive(Debug, Clone)]
pub struct FetchOutput {
    pub stats: Map<String, Value>,
    pub players: usize,
}

/// Fetch every configured team and write the raw JSON file.
pub fn run_fetch(config: &FetchConfig, reporter: Arc<dyn Reporter>) -> Result<FetchOutput, AppError> {
    let teams = normalize_teams(&config.teams)?;
    let client = StatsClient::with_base_url(config.base_url.clone(), reporter.clone());
    let stats = client.fetch_all_team_stats(&teams);

    let players = stats
        .values()
        .map(|v| v.as_array().map_or(0, Vec::len))
        .sum();
    if players == 0 {
        reporter.warn("No player records were fetched");
    }

    reporter.info(RAW_LOG_MARKER);
    crate::io::write_team_stats(&config.output, &stats)?;
    reporter.info(&format!("Stats saved to {}", config.output.display()));

    Ok(FetchOutput { stats, players })
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub dataset: Dataset,
    /// `None` when no players survived and nothing was written.
    pub csv_path: Option<PathBuf>,
}

/// Raw JSON -> assembled dataset -> CSV.
pub fn run_process(config: &ProcessConfig, reporter: Arc<dyn Reporter>) -> Result<ProcessOutput, AppError> {
    let teams = normalize_teams(&config.teams_of_interest)?;
    let raw = crate::io::load_team_stats(&config.input, &reporter);

    let assembler = DatasetAssembler::new(FeatureExtractor::new(config.reference_year), &teams, reporter.clone());
    let dataset = assembler.assemble(&raw);

    if dataset.is_empty() {
        reporter.warn("No valid player data was found to save");
        return Ok(ProcessOutput {
            dataset,
            csv_path: None,
        });
    }

    let path = config.output_dir.join(DATASET_FILE_NAME);
    crate::io::write_dataset_csv(&path, &dataset)?;
    reporter.info(&format!("Saved processed data to {}", path.display()));

    Ok(ProcessOutput {
        dataset,
        csv_path: Some(path),
    })
}

#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub trainer: ModelTrainer,
    pub metrics: TrainMetrics,
    pub importances: Vec<FeatureImportance>,
    pub rows: usize,
}

/// Dataset CSV -> trained model -> bundle file.
pub fn run_train(config: &TrainConfig, reporter: Arc<dyn Reporter>) -> Result<TrainOutput, AppError> {
    let dataset = crate::io::read_dataset_csv(&config.data)?;
    let table = prediction_table(&dataset, &config.target)?;
    reporter.info(&format!(
        "Training {} on {} skaters",
        config.model_kind.display_name(),
        table.n_rows()
    ));

    let mut trainer = ModelTrainer::new(config.model_kind);
    let metrics = trainer.train(&table, &config.target)?;
    let importances = trainer.get_feature_importance()?;

    trainer.save_model(&config.output)?;
    reporter.info(&format!("Model saved to {}", config.output.display()));

    Ok(TrainOutput {
        trainer,
        metrics,
        importances,
        rows: table.n_rows(),
    })
}

#[derive(Debug, Clone)]
pub struct PredictOutput {
    pub evaluator: Evaluator,
    pub metrics: EvalMetrics,
    pub importances: Vec<FeatureImportance>,
    /// Randomly chosen players with their predictions.
    pub sample: Vec<(String, PredictionRow)>,
    pub charts: Vec<PathBuf>,
}

/// Saved bundle + dataset -> predictions, metrics, and optional SVG charts.
pub fn run_predict(config: &PredictConfig, reporter: Arc<dyn Reporter>) -> Result<PredictOutput, AppError> {
    let trainer = ModelTrainer::load(&config.model)?;
    let target = trainer.processor().target_column()?.to_string();
    reporter.info(&format!(
        "Loaded {} model predicting '{target}'",
        trainer.kind().display_name()
    ));

    let dataset = skaters(&crate::io::read_dataset_csv(&config.data)?, config.min_games);
    let table = prediction_table(&dataset, &target)?;
    let target_idx = table
        .column_index(&target)
        .ok_or_else(|| AppError::data(format!("Target column '{target}' not found.")))?;

    // Only rows with a known target can be scored against it.
    let scored: Vec<usize> = (0..table.n_rows())
        .filter(|&i| table.rows[i][target_idx].is_some())
        .collect();
    if scored.is_empty() {
        return Err(AppError::data(format!(
            "No skaters with at least {} games to score.",
            config.min_games
        )));
    }
    let table = table.select_rows(&scored);
    let actual: Vec<f64> = table.column(target_idx).into_iter().flatten().collect();

    let predicted = trainer.predict(&table)?;
    let mut evaluator = Evaluator::new();
    let metrics = evaluator.evaluate(&actual, &predicted)?;
    let importances = trainer.get_feature_importance()?;

    let rows = evaluator.prediction_summary()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut picked: Vec<usize> = (0..rows.len()).collect();
    picked.shuffle(&mut rng);
    picked.truncate(config.sample);
    let sample = picked
        .into_iter()
        .map(|i| (dataset.records[scored[i]].name.clone(), rows[i]))
        .collect();

    let mut charts = Vec::new();
    if let Some(dir) = &config.plots_dir {
        let predictions = dir.join("predictions.svg");
        let residuals = dir.join("residuals.svg");
        let importance = dir.join("feature_importance.svg");
        evaluator.plot_predictions(&predictions)?;
        evaluator.plot_residuals(&residuals)?;
        charts.push(predictions);
        charts.push(residuals);
        if importances.iter().any(|f| f.importance.is_some()) {
            evaluator.plot_feature_importance(&importances, 10, &importance)?;
            charts.push(importance);
        }
        reporter.info(&format!("Wrote {} charts to {}", charts.len(), dir.display()));
    }

    Ok(PredictOutput {
        evaluator,
        metrics,
        importances,
        sample,
        charts,
    })
}

#[derive(Debug, Clone)]
pub struct TeamOutput {
    pub summary: TeamSummary,
    pub games: usize,
}

pub fn run_team(config: &TeamConfig, reporter: Arc<dyn Reporter>) -> Result<TeamOutput, AppError> {
    let team = team_by_abbrev(&config.team)
        .ok_or_else(|| AppError::usage(format!("Unknown team '{}'.", config.team)))?;
    let client = StatsClient::with_base_url(config.base_url.clone(), reporter);

    let summary = client.get_team_stats(team.id).ok_or_else(|| {
        AppError::new(
            crate::error::ErrorKind::Network,
            format!("No team info available for {}.", team.abbrev),
        )
    })?;
    let games = client.get_team_schedule(team.id, &config.season).len();

    Ok(TeamOutput { summary, games })
}

/// Trim, uppercase, and de-duplicate team codes (order kept).
fn normalize_teams(teams: &[String]) -> Result<Vec<String>, AppError> {
    let mut out: Vec<String> = Vec::with_capacity(teams.len());
    for t in teams {
        let code = t.trim().to_ascii_uppercase();
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    if out.is_empty() {
        return Err(AppError::usage("At least one team is required."));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teams_are_normalized() {
        let teams = vec![" tor".to_string(), "FLA".to_string(), "Tor".to_string()];
        assert_eq!(normalize_teams(&teams).unwrap(), vec!["TOR", "FLA"]);
        assert!(normalize_teams(&[" ".to_string()]).is_err());
    }
}
