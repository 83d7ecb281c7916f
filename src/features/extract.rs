//! Raw player JSON → flat `FeatureRecord`.
//!
//! Every lookup is defensive: a missing or mistyped field falls back to its
//! default (`None`, empty string, or 0) and extraction never fails.

use serde_json::Value;

use crate::data::RawRecord;
use crate::domain::{CountingStats, DEFAULT_REFERENCE_YEAR, FeatureRecord};

const SEASON_PATH: [&str; 3] = ["featuredStats", "regularSeason", "subSeason"];
const CAREER_PATH: [&str; 2] = ["careerTotals", "regularSeason"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureExtractor {
    /// Ages are `reference_year - birth year`, not wall-clock based.
    reference_year: i32,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_YEAR)
    }
}

impl FeatureExtractor {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn extract(&self, raw: &RawRecord) -> FeatureRecord {
        let season = counting_stats(nested(raw, &SEASON_PATH));
        let career = counting_stats(nested(raw, &CAREER_PATH));
        let games = season.games_played;

        FeatureRecord {
            player_id: raw.get("playerId").and_then(Value::as_i64),
            team: text(raw.get("currentTeamAbbrev")),
            position: text(raw.get("position")),
            name: full_name(raw),
            age: age_from_birth_date(raw.get("birthDate"), self.reference_year),
            height_cm: raw.get("heightInCentimeters").and_then(Value::as_f64),
            weight_kg: raw.get("weightInKilograms").and_then(Value::as_f64),
            season,
            career,
            goals_per_game: per_game(season.goals, games),
            points_per_game: per_game(season.points, games),
            shots_per_game: per_game(season.shots, games),
        }
    }
}

/// `"First Last"`, trimmed. Either part may be a plain string or a localized
/// mapping with a `default` entry.
pub fn full_name(raw: &RawRecord) -> String {
    let first = name_part(raw.get("firstName"));
    let last = name_part(raw.get("lastName"));
    format!("{first} {last}").trim().to_string()
}

fn name_part(value: Option<&Value>) -> String {
    match value {
        Some(Value::Object(map)) => map
            .get("default")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// `reference_year - YYYY`, where `YYYY` is the text before the first `-`.
///
/// Only the year is read, so `1996-02-30` and `1996-09-17T00:00:00Z` both
/// count as born in 1996. `None` if absent or the year isn't four digits.
pub fn age_from_birth_date(value: Option<&Value>, reference_year: i32) -> Option<i32> {
    let raw = value?.as_str()?;
    let year = raw.trim().split('-').next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    Some(reference_year - year)
}

fn counting_stats(node: Option<&Value>) -> CountingStats {
    let get = |key: &str| node.and_then(|n| n.get(key));
    CountingStats {
        games_played: int(get("gamesPlayed")),
        goals: int(get("goals")),
        assists: int(get("assists")),
        points: int(get("points")),
        plus_minus: int(get("plusMinus")),
        pim: int(get("pim")),
        shots: int(get("shots")),
        shooting_pct: get("shootingPctg").and_then(Value::as_f64).unwrap_or(0.0),
        powerplay_goals: int(get("powerPlayGoals")),
        powerplay_points: int(get("powerPlayPoints")),
    }
}

fn nested<'a>(raw: &'a RawRecord, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut node = raw.get(*first)?;
    for key in rest {
        node = node.get(*key)?;
    }
    Some(node)
}

fn int(value: Option<&Value>) -> i64 {
    value
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
        .unwrap_or(0)
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn per_game(count: i64, games: i64) -> f64 {
    if games > 0 {
        count as f64 / games as f64
    } else {
        0.0
    }
}
