//! Command-line parsing for the NHL stats pipeline.
//!
//! Argument parsing and command dispatch stay separate from the data and
//! modelling code: `app` turns these structs into config structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{API_BASE, DEFAULT_REFERENCE_YEAR, DEFAULT_SEASON, ModelKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "nhl", version, about = "NHL player stats fetcher and point predictor")]
pub struct Cli {
    /// Stats API base URL.
    #[arg(long, global = true, default_value = API_BASE)]
    pub base_url: String,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch rosters and player records and save them as raw JSON.
    Fetch(FetchArgs),
    /// Turn raw JSON into the processed player dataset CSV.
    Process(ProcessArgs),
    /// Train a point predictor and save the model bundle.
    Train(TrainArgs),
    /// Score players with a saved model and chart the results.
    Predict(PredictArgs),
    /// Show a team's summary and schedule size.
    Team(TeamArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Team abbreviations to fetch, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = default_teams())]
    pub teams: Vec<String>,

    /// Raw stats JSON to write.
    #[arg(short, long, default_value = "output.json")]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ProcessArgs {
    /// Raw stats JSON written by `nhl fetch`.
    #[arg(short, long, default_value = "output.json")]
    pub input: PathBuf,

    /// Directory for processed_player_stats.csv.
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Teams of interest, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = default_teams())]
    pub teams: Vec<String>,

    /// Year that ages are computed against.
    #[arg(long, default_value_t = DEFAULT_REFERENCE_YEAR)]
    pub reference_year: i32,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Processed dataset CSV.
    #[arg(long, default_value = "data/processed_player_stats.csv")]
    pub data: PathBuf,

    /// Model family.
    #[arg(long, value_enum, default_value_t = ModelKind::RandomForest)]
    pub model: ModelKind,

    /// Target column.
    #[arg(long, default_value = "points")]
    pub target: String,

    /// Model bundle to write.
    #[arg(short, long, default_value = "models/nhl_point_predictor.json")]
    pub output: PathBuf,

    /// How many feature importances to print.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Model bundle written by `nhl train`.
    #[arg(long, default_value = "models/nhl_point_predictor.json")]
    pub model: PathBuf,

    /// Processed dataset CSV.
    #[arg(long, default_value = "data/processed_player_stats.csv")]
    pub data: PathBuf,

    /// Only score skaters with at least this many games.
    #[arg(long, default_value_t = 40)]
    pub min_games: i64,

    /// Number of players to list.
    #[arg(long, default_value_t = 10)]
    pub sample: usize,

    /// Seed for picking the listed players.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Write SVG charts into this directory.
    #[arg(long)]
    pub plots_dir: Option<PathBuf>,

    /// Terminal plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Terminal plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TeamArgs {
    /// Team abbreviation.
    #[arg(long)]
    pub team: String,

    /// Season, e.g. 20232024.
    #[arg(long, default_value = DEFAULT_SEASON)]
    pub season: String,
}

fn default_teams() -> Vec<String> {
    crate::data::default_teams()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_team_list() {
        let cli = Cli::try_parse_from(["nhl", "fetch", "--teams", "TOR,BOS"]).unwrap();
        assert_eq!(cli.base_url, API_BASE);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.teams, vec!["TOR", "BOS"]);
        assert_eq!(args.output, PathBuf::from("output.json"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["nhl", "train", "--model", "gradient-boosting", "-v"]).unwrap();
        assert!(cli.verbose);
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.model, ModelKind::GradientBoosting);
        assert_eq!(args.target, "points");
    }

    #[test]
    fn team_requires_a_code() {
        assert!(Cli::try_parse_from(["nhl", "team"]).is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
