//! Team → raw player records → `Dataset`.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::Dataset;
use crate::features::FeatureExtractor;
use crate::logging::Reporter;

pub struct DatasetAssembler {
    extractor: FeatureExtractor,
    teams_of_interest: HashSet<String>,
    reporter: Arc<dyn Reporter>,
}

impl DatasetAssembler {
    pub fn new(
        extractor: FeatureExtractor,
        teams_of_interest: &[String],
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            extractor,
            teams_of_interest: teams_of_interest.iter().cloned().collect(),
            reporter,
        }
    }

    /// Extract every player of every team, in input order.
    ///
    /// A player is kept at most once (first occurrence wins) and only when
    /// its extracted team is one of the teams of interest. Players without a
    /// `playerId` or team are dropped. A team whose value isn't a list of
    /// records contributes no rows.
    pub fn assemble(&self, raw: &Map<String, Value>) -> Dataset {
        let mut records = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();

        for (team_code, team_data) in raw {
            self.reporter.info(&format!("Processing {team_code} data..."));

            let Some(players) = team_data.as_array() else {
                self.reporter
                    .warn(&format!("Skipping {team_code}: expected a list of player records"));
                continue;
            };

            let mut kept = 0usize;
            for entry in players {
                let Some(player) = entry.as_object() else {
                    continue;
                };
                let Some(player_id) = player.get("playerId").and_then(Value::as_i64) else {
                    continue;
                };
                if seen.contains(&player_id) {
                    continue;
                }

                let features = self.extractor.extract(player);
                let in_scope = features
                    .team
                    .as_ref()
                    .is_some_and(|t| self.teams_of_interest.contains(t));
                if !in_scope {
                    continue;
                }

                seen.insert(player_id);
                self.reporter
                    .info(&format!("Processed player: {}", features.name));
                records.push(features);
                kept += 1;
            }

            self.reporter
                .info(&format!("Kept {kept} of {} players for {team_code}", players.len()));
        }

        self.reporter
            .info(&format!("Created dataset with {} players", records.len()));
        Dataset::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryReporter;
    use serde_json::json;
    use tracing::Level;

    fn player(id: i64, team: &str, points: i64) -> Value {
        json!({
            "playerId": id,
            "firstName": {"default": format!("P{id}")},
            "lastName": "Test",
            "currentTeamAbbrev": team,
            "featuredStats": {"regularSeason": {"subSeason": {"gamesPlayed": 10, "points": points}}}
        })
    }

    fn assembler(teams: &[&str]) -> (DatasetAssembler, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        let teams: Vec<String> = teams.iter().map(|t| t.to_string()).collect();
        (
            DatasetAssembler::new(FeatureExtractor::default(), &teams, reporter.clone()),
            reporter,
        )
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn duplicate_player_ids_keep_first_occurrence() {
        let (asm, _) = assembler(&["TOR", "FLA"]);
        let raw = map(json!({
            "TOR": [player(1, "TOR", 10), player(2, "TOR", 20)],
            "FLA": [player(1, "TOR", 99), player(3, "FLA", 30)]
        }));

        let ds = asm.assemble(&raw);
        let ids: Vec<i64> = ds.records.iter().filter_map(|r| r.player_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(ds.records[0].season.points, 10);
    }

    #[test]
    fn teams_outside_scope_are_excluded() {
        let (asm, _) = assembler(&["TOR"]);
        let raw = map(json!({"TOR": [player(1, "TOR", 10), player(2, "BOS", 20)]}));

        let ds = asm.assemble(&raw);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].team.as_deref(), Some("TOR"));
    }

    #[test]
    fn filtered_out_player_can_still_appear_later() {
        // Only kept players count as seen.
        let (asm, _) = assembler(&["FLA"]);
        let raw = map(json!({
            "TOR": [player(1, "TOR", 10)],
            "FLA": [player(1, "FLA", 12)]
        }));

        let ds = asm.assemble(&raw);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].team.as_deref(), Some("FLA"));
    }

    #[test]
    fn malformed_teams_and_records_contribute_nothing() {
        let (asm, reporter) = assembler(&["TOR", "FLA"]);
        let raw = map(json!({
            "TOR": "not a list",
            "FLA": [42, {"firstName": "No Id", "currentTeamAbbrev": "FLA"}, player(5, "FLA", 1)],
            "BOS": []
        }));

        let ds = asm.assemble(&raw);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].player_id, Some(5));
        assert_eq!(reporter.messages_at(Level::WARN).len(), 1);
        assert!(reporter
            .messages_at(Level::INFO)
            .contains(&"Created dataset with 1 players".to_string()));
    }

    #[test]
    fn records_without_team_are_dropped() {
        let (asm, _) = assembler(&["TOR"]);
        let raw = map(json!({"TOR": [{"playerId": 9, "firstName": "No Team"}]}));
        assert!(asm.assemble(&raw).is_empty());
    }
}
