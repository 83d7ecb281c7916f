//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads `.env`
//! - installs logging
//! - turns arguments into config structs
//! - runs the pipeline step and prints its report

use std::sync::Arc;

use clap::Parser;

use crate::cli::{Cli, Command, FetchArgs, PredictArgs, ProcessArgs, TeamArgs, TrainArgs};
use crate::domain::{API_KEY_ENV, FetchConfig, PredictConfig, ProcessConfig, TeamConfig, TrainConfig};
use crate::error::AppError;
use crate::logging::{Reporter, init_subscriber, tracing_reporter};

pub mod pipeline;

/// Entry point for the `nhl` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; values may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_subscriber(cli.verbose);
    let reporter = tracing_reporter();
    check_api_key(reporter.as_ref());

    let base_url = cli.base_url.clone();
    match cli.command {
        Command::Fetch(args) => handle_fetch(&fetch_config_from_args(&args, &base_url), reporter),
        Command::Process(args) => handle_process(&process_config_from_args(&args), reporter),
        Command::Train(args) => handle_train(&train_config_from_args(&args), reporter),
        Command::Predict(args) => handle_predict(&predict_config_from_args(&args), reporter),
        Command::Team(args) => handle_team(&team_config_from_args(&args, &base_url), reporter),
    }
}

/// The key is never sent; its absence is only worth a reminder.
fn check_api_key(reporter: &dyn Reporter) {
    if std::env::var_os(API_KEY_ENV).is_none_or(|v| v.is_empty()) {
        reporter.warn(&format!("{API_KEY_ENV} is not set (not required by the public API)"));
    }
}

fn handle_fetch(config: &FetchConfig, reporter: Arc<dyn Reporter>) -> Result<(), AppError> {
    let out = pipeline::run_fetch(config, reporter)?;
    println!(
        "Fetched {} players across {} teams into {}",
        out.players,
        out.stats.len(),
        config.output.display()
    );
    Ok(())
}

fn handle_process(config: &ProcessConfig, reporter: Arc<dyn Reporter>) -> Result<(), AppError> {
    let out = pipeline::run_process(config, reporter)?;
    if out.csv_path.is_some() {
        println!("{}", crate::report::format_dataset_summary(&out.dataset));
    }
    Ok(())
}

fn handle_train(config: &TrainConfig, reporter: Arc<dyn Reporter>) -> Result<(), AppError> {
    let out = pipeline::run_train(config, reporter)?;
    println!("{}", crate::report::format_train_metrics(out.trainer.kind(), &out.metrics));
    println!("{}", crate::report::format_importances(&out.importances, config.top_n));
    Ok(())
}

fn handle_predict(config: &PredictConfig, reporter: Arc<dyn Reporter>) -> Result<(), AppError> {
    let out = pipeline::run_predict(config, reporter)?;

    println!("{}", crate::report::format_predictions(&out.sample));
    println!("{}", crate::report::format_eval_metrics(&out.metrics));
    println!(
        "Actual (x) vs predicted (y):\n{}",
        out.evaluator.render_predictions(config.plot_width, config.plot_height)?
    );
    println!(
        "Predicted (x) vs residual (y):\n{}",
        out.evaluator.render_residuals(config.plot_width, config.plot_height)?
    );
    if out.importances.iter().any(|f| f.importance.is_some()) {
        println!(
            "{}",
            out.evaluator
                .render_feature_importance(&out.importances, 10, config.plot_width / 2)?
        );
    }
    for path in &out.charts {
        println!("Chart: {}", path.display());
    }
    Ok(())
}

fn handle_team(config: &TeamConfig, reporter: Arc<dyn Reporter>) -> Result<(), AppError> {
    let out = pipeline::run_team(config, reporter)?;
    println!("{}", crate::report::format_team_summary(&out.summary, &config.season, out.games));
    Ok(())
}

pub fn fetch_config_from_args(args: &FetchArgs, base_url: &str) -> FetchConfig {
    FetchConfig {
        base_url: base_url.to_string(),
        teams: args.teams.clone(),
        output: args.output.clone(),
    }
}

pub fn process_config_from_args(args: &ProcessArgs) -> ProcessConfig {
    ProcessConfig {
        input: args.input.clone(),
        output_dir: args.output_dir.clone(),
        teams_of_interest: args.teams.clone(),
        reference_year: args.reference_year,
    }
}

pub fn train_config_from_args(args: &TrainArgs) -> TrainConfig {
    TrainConfig {
        data: args.data.clone(),
        model_kind: args.model,
        target: args.target.clone(),
        output: args.output.clone(),
        top_n: args.top,
    }
}

pub fn predict_config_from_args(args: &PredictArgs) -> PredictConfig {
    PredictConfig {
        model: args.model.clone(),
        data: args.data.clone(),
        min_games: args.min_games,
        sample: args.sample,
        seed: args.seed,
        plots_dir: args.plots_dir.clone(),
        plot_width: args.width,
        plot_height: args.height,
    }
}

pub fn team_config_from_args(args: &TeamArgs, base_url: &str) -> TeamConfig {
    TeamConfig {
        base_url: base_url.to_string(),
        team: args.team.clone(),
        season: args.season.clone(),
    }
}
