//! End-to-end checks of the process -> train -> predict workflow on disk.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::Level;

use nhl_ml::app::pipeline::{run_predict, run_process, run_train};
use nhl_ml::domain::{ModelKind, PredictConfig, ProcessConfig, TrainConfig};
use nhl_ml::features::{DatasetAssembler, FeatureExtractor, point_prediction_table};
use nhl_ml::io::{DATASET_FILE_NAME, RAW_LOG_MARKER, read_dataset_csv, write_dataset_csv};
use nhl_ml::logging::{MemoryReporter, Reporter};
use nhl_ml::ml::ModelTrainer;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nhl-ml-it-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn player(id: i64, team: &str, position: &str, i: i64) -> Value {
    let games = 45 + i % 30;
    let shots = 40 + 4 * i;
    let goals = shots / 9;
    let assists = (i * 7) % 31;
    json!({
        "playerId": id,
        "firstName": {"default": format!("Skater{i}")},
        "lastName": {"default": team},
        "currentTeamAbbrev": team,
        "position": position,
        "birthDate": format!("{}-03-14", 1990 + i % 12),
        "heightInCentimeters": 175 + i % 15,
        "weightInKilograms": 80 + i % 20,
        "featuredStats": {"regularSeason": {"subSeason": {
            "gamesPlayed": games,
            "goals": goals,
            "assists": assists,
            "points": goals + assists,
            "plusMinus": (i % 11) - 5,
            "pim": i % 17,
            "shots": shots,
            "shootingPctg": goals as f64 / shots as f64,
            "powerPlayGoals": goals / 4,
            "powerPlayPoints": (goals + assists) / 4
        }}},
        "careerTotals": {"regularSeason": {
            "gamesPlayed": 100 + 20 * i,
            "goals": 10 + 3 * i,
            "assists": 15 + 4 * i,
            "points": 25 + 7 * i,
            "plusMinus": i % 9,
            "pim": 30 + i,
            "shots": 200 + 30 * i,
            "shootingPctg": 0.1,
            "powerPlayGoals": i,
            "powerPlayPoints": 2 * i
        }}
    })
}

/// 24 TOR/FLA skaters, one goalie, a duplicate listing, and an out-of-scope team.
fn raw_stats() -> Map<String, Value> {
    let mut tor = Vec::new();
    let mut fla = Vec::new();
    for i in 0..24 {
        let position = if i % 3 == 0 { "D" } else { "C" };
        if i % 2 == 0 {
            tor.push(player(8_470_000 + i, "TOR", position, i));
        } else {
            fla.push(player(8_470_000 + i, "FLA", position, i));
        }
    }
    tor.push(player(8_480_000, "TOR", "G", 5));
    fla.push(tor[0].clone());

    let mut map = Map::new();
    map.insert("TOR".into(), Value::Array(tor));
    map.insert("FLA".into(), Value::Array(fla));
    map.insert("BOS".into(), Value::Array(vec![player(8_490_000, "BOS", "C", 3)]));
    map
}

fn teams() -> Vec<String> {
    vec!["TOR".to_string(), "FLA".to_string()]
}

#[test]
fn assembled_dataset_survives_csv_and_model_round_trip() {
    let dir = scratch_dir("roundtrip");
    let reporter: Arc<dyn Reporter> = Arc::new(MemoryReporter::new());

    let assembler = DatasetAssembler::new(FeatureExtractor::new(2024), &teams(), reporter);
    let dataset = assembler.assemble(&raw_stats());
    // 24 skaters + 1 goalie; the duplicate and the BOS player are dropped.
    assert_eq!(dataset.len(), 25);
    assert!(dataset.records.iter().all(|r| r.team.as_deref() != Some("BOS")));

    let csv = dir.join(DATASET_FILE_NAME);
    write_dataset_csv(&csv, &dataset).unwrap();
    let reloaded = read_dataset_csv(&csv).unwrap();
    assert_eq!(reloaded.len(), dataset.len());
    assert_eq!(reloaded.records[0].name, dataset.records[0].name);

    let table = point_prediction_table(&reloaded).unwrap();
    assert_eq!(table.n_rows(), 24);

    let mut trainer = ModelTrainer::new(ModelKind::GradientBoosting);
    let metrics = trainer.train(&table, "points").unwrap();
    assert!(metrics.train_mse.is_finite());

    let model_path = dir.join("models").join("points.json");
    trainer.save_model(&model_path).unwrap();

    let mut restored = ModelTrainer::new(ModelKind::RandomForest);
    restored.load_model(&model_path).unwrap();
    assert_eq!(restored.kind(), ModelKind::GradientBoosting);
    assert_eq!(restored.predict(&table).unwrap(), trainer.predict(&table).unwrap());
    assert_eq!(
        restored.get_feature_importance().unwrap(),
        trainer.get_feature_importance().unwrap()
    );
}

#[test]
fn pipeline_steps_chain_through_files() {
    let dir = scratch_dir("pipeline");
    let memory = Arc::new(MemoryReporter::new());
    let reporter: Arc<dyn Reporter> = memory.clone();

    // The raw file may carry log output ahead of the JSON payload.
    let raw_path = dir.join("raw.json");
    let payload = serde_json::to_string_pretty(&Value::Object(raw_stats())).unwrap();
    std::fs::write(&raw_path, format!("INFO fetching...\nINFO {RAW_LOG_MARKER}\n{payload}")).unwrap();

    let processed = run_process(
        &ProcessConfig {
            input: raw_path,
            output_dir: dir.join("data"),
            teams_of_interest: teams(),
            reference_year: 2024,
        },
        reporter.clone(),
    )
    .unwrap();
    let csv = processed.csv_path.expect("dataset written");
    assert!(csv.exists());
    assert_eq!(processed.dataset.len(), 25);

    let model_path = dir.join("model.json");
    let trained = run_train(
        &TrainConfig {
            data: csv.clone(),
            model_kind: ModelKind::RandomForest,
            target: "points".into(),
            output: model_path.clone(),
            top_n: 5,
        },
        reporter.clone(),
    )
    .unwrap();
    assert_eq!(trained.rows, 24);
    assert!(model_path.exists());
    assert!(trained.importances.iter().all(|f| f.importance.is_some()));

    let plots = dir.join("plots");
    let predicted = run_predict(
        &PredictConfig {
            model: model_path,
            data: csv,
            min_games: 50,
            sample: 5,
            seed: 7,
            plots_dir: Some(plots.clone()),
            plot_width: 60,
            plot_height: 15,
        },
        reporter,
    )
    .unwrap();

    assert_eq!(predicted.sample.len(), 5);
    assert!(predicted.metrics.mse >= 0.0);
    assert_eq!(predicted.charts.len(), 3);
    for name in ["predictions.svg", "residuals.svg", "feature_importance.svg"] {
        assert!(plots.join(name).exists(), "{name} missing");
    }
    assert!(memory.messages_at(Level::ERROR).is_empty());
}

#[test]
fn process_without_matching_players_writes_nothing() {
    let dir = scratch_dir("empty");
    let memory = Arc::new(MemoryReporter::new());

    let raw_path = dir.join("raw.json");
    std::fs::write(&raw_path, r#"{"BOS": []}"#).unwrap();

    let out = run_process(
        &ProcessConfig {
            input: raw_path,
            output_dir: dir.join("data"),
            teams_of_interest: teams(),
            reference_year: 2024,
        },
        memory.clone(),
    )
    .unwrap();

    assert!(out.dataset.is_empty());
    assert!(out.csv_path.is_none());
    assert!(!dir.join("data").join(DATASET_FILE_NAME).exists());
    assert!(
        memory
            .messages_at(Level::WARN)
            .iter()
            .any(|m| m.contains("No valid player data"))
    );
}
