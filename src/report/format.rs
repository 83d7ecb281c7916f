//! Formatted terminal output.
//!
//! Formatting lives here so the pipeline code only decides *what* to show and
//! output changes stay localized (snapshot-friendly).

use crate::domain::{Dataset, EvalMetrics, FeatureImportance, ModelKind, PredictionRow, TeamSummary, TrainMetrics};
use crate::report::describe_columns;

/// Numeric columns shown under "Feature statistics".
const DESCRIBE_COLUMNS: [&str; 8] = [
    "age",
    "height_cm",
    "weight_kg",
    "games_played",
    "goals",
    "assists",
    "points",
    "points_per_game",
];

/// Totals, team/position distributions, top scorers, and column statistics.
pub fn format_dataset_summary(dataset: &Dataset) -> String {
    let mut out = String::new();

    out.push_str("Dataset Summary:\n");
    out.push_str(&format!("{:-<20}\n", ""));
    out.push_str(&format!("Total players: {}\n", dataset.len()));

    out.push_str("\nTeam distribution:\n");
    out.push_str(&format_counts(&dataset.value_counts("team")));

    out.push_str("\nPosition distribution:\n");
    out.push_str(&format_counts(&dataset.value_counts("position")));

    out.push_str("\nTop 10 players by points:\n");
    out.push_str(&format!(
        "{:<24} {:<4} {:<3} {:>6} {:>8}\n",
        "name", "team", "pos", "points", "pts/gp"
    ));
    out.push_str(&format!("{:-<24} {:-<4} {:-<3} {:-<6} {:-<8}\n", "", "", "", "", ""));
    for r in dataset.top_by_points(10) {
        out.push_str(&format!(
            "{:<24} {:<4} {:<3} {:>6} {:>8.3}\n",
            truncate(&r.name, 24),
            r.team.as_deref().unwrap_or(""),
            r.position.as_deref().unwrap_or(""),
            r.season.points,
            r.points_per_game,
        ));
    }

    out.push_str("\nFeature statistics:\n");
    out.push_str(&format!(
        "{:<16} {:>6} {:>10} {:>10} {:>10}\n",
        "column", "count", "mean", "min", "max"
    ));
    for s in describe_columns(dataset, &DESCRIBE_COLUMNS) {
        out.push_str(&format!(
            "{:<16} {:>6} {:>10} {:>10} {:>10}\n",
            s.column,
            s.count,
            fmt_opt(s.mean),
            fmt_opt(s.min),
            fmt_opt(s.max),
        ));
    }

    out
}

pub fn format_train_metrics(kind: ModelKind, metrics: &TrainMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Model performance ({}):\n", kind.display_name()));
    for (name, value) in metrics.pairs() {
        out.push_str(&format!("{name:<12} {value:>12.4}\n"));
    }
    out
}

pub fn format_eval_metrics(metrics: &EvalMetrics) -> String {
    let mut out = String::from("Evaluation metrics:\n");
    for (name, value) in metrics.pairs() {
        out.push_str(&format!("{name:<20} {value:>12.4}\n"));
    }
    out
}

/// Top `top_n` importances; a missing importance prints as `n/a`.
pub fn format_importances(importances: &[FeatureImportance], top_n: usize) -> String {
    let mut out = format!("Top {} most important features:\n", top_n.min(importances.len()));
    for f in importances.iter().take(top_n) {
        out.push_str(&format!("{:<26} {:>8}\n", truncate(&f.feature, 26), fmt_opt(f.importance)));
    }
    out
}

/// Sampled predictions labelled by player name.
pub fn format_predictions(rows: &[(String, PredictionRow)]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:>8} {:>10} {:>9}\n",
        "player", "actual", "predicted", "residual"
    ));
    out.push_str(&format!("{:-<24} {:-<8} {:-<10} {:-<9}\n", "", "", "", ""));
    for (name, r) in rows {
        out.push_str(&format!(
            "{:<24} {:>8.1} {:>10.1} {:>9.1}\n",
            truncate(name, 24),
            r.actual,
            r.predicted,
            r.residual,
        ));
    }
    out
}

pub fn format_team_summary(summary: &TeamSummary, season: &str, n_games: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} (team id {})\n", summary.name, summary.team_id));
    out.push_str(&format!("Games played : {}\n", summary.games_played));
    out.push_str(&format!("Points       : {}\n", summary.points));
    out.push_str(&format!("Goals for    : {}\n", summary.goals_for));
    out.push_str(&format!("Goals against: {}\n", summary.goals_against));
    out.push_str(&format!("Schedule {season}: {n_games} games\n"));
    out
}

fn format_counts(counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(k, n)| format!("{:<8} {n:>5}\n", if k.is_empty() { "(none)" } else { k.as_str() }))
        .collect()
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "n/a".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
