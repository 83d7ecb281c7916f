//! NHL web API client.
//!
//! Every call is a single best-effort GET: transport errors, non-2xx statuses,
//! and undecodable bodies are logged and turned into an empty result.

use std::sync::Arc;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};

use crate::data::json_kind;
use crate::domain::TeamSummary;
use crate::error::{AppError, ErrorKind};
use crate::logging::Reporter;

/// One raw JSON object from the API (player, roster stub, team, game).
pub type RawRecord = Map<String, Value>;

/// Roster groups, concatenated in this order.
const ROSTER_GROUPS: [&str; 3] = ["forwards", "defensemen", "goalies"];

pub struct StatsClient {
    client: Client,
    base_url: String,
    reporter: Arc<dyn Reporter>,
}

impl StatsClient {
    pub fn with_base_url(base_url: impl Into<String>, reporter: Arc<dyn Reporter>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            reporter,
        }
    }

    /// Current roster: forwards, then defensemen, then goalies.
    pub fn get_team_roster(&self, team_code: &str) -> Vec<RawRecord> {
        let url = format!("{}/roster/{team_code}/current", self.base_url);
        self.reporter.info(&format!("Fetching roster for {team_code}"));

        match self.get_json(&url) {
            Ok(body) => {
                let mut players = Vec::new();
                for group in ROSTER_GROUPS {
                    if let Some(entries) = body.get(group).and_then(Value::as_array) {
                        players.extend(entries.iter().filter_map(|e| e.as_object().cloned()));
                    }
                }
                self.reporter
                    .info(&format!("Found {} players on {team_code} roster", players.len()));
                players
            }
            Err(e) => {
                self.reporter
                    .error(&format!("Error fetching roster for {team_code}: {e}"));
                Vec::new()
            }
        }
    }

    /// Player landing record; empty on failure.
    pub fn get_player_stats(&self, player_id: i64) -> RawRecord {
        let url = format!("{}/player/{player_id}/landing", self.base_url);
        self.reporter
            .info(&format!("Fetching stats for player ID {player_id}"));

        match self.get_object(&url) {
            Ok(record) => {
                if !record.is_empty() {
                    let name = crate::features::full_name(&record);
                    self.reporter.info(&format!("Found stats for {name}"));
                }
                record
            }
            Err(e) => {
                self.reporter
                    .error(&format!("Error fetching stats for player ID {player_id}: {e}"));
                RawRecord::new()
            }
        }
    }

    /// Club stats record; empty on failure.
    pub fn get_team_info(&self, team_id: u32) -> RawRecord {
        let url = format!("{}/club-stats/team/{team_id}/now", self.base_url);

        match self.get_object(&url) {
            Ok(record) => {
                self.reporter
                    .info(&format!("Fetched team info for team {team_id} ({} fields)", record.len()));
                record
            }
            Err(e) => {
                self.reporter.error(&format!("Error fetching team info: {e}"));
                RawRecord::new()
            }
        }
    }

    /// Games of a season (e.g. `20232024`); empty on failure.
    pub fn get_team_schedule(&self, team_id: u32, season: &str) -> Vec<RawRecord> {
        let url = format!("{}/club-schedule-season/{team_id}/{season}", self.base_url);

        match self.get_json(&url) {
            Ok(body) => {
                let games: Vec<RawRecord> = body
                    .get("games")
                    .and_then(Value::as_array)
                    .map(|g| g.iter().filter_map(|e| e.as_object().cloned()).collect())
                    .unwrap_or_default();
                self.reporter.info(&format!(
                    "Found {} games for team {team_id} in {season}",
                    games.len()
                ));
                games
            }
            Err(e) => {
                self.reporter.error(&format!("Error fetching schedule: {e}"));
                Vec::new()
            }
        }
    }

    /// Condensed team info, or `None` when the info call came back empty.
    pub fn get_team_stats(&self, team_id: u32) -> Option<TeamSummary> {
        let info = self.get_team_info(team_id);
        if info.is_empty() {
            return None;
        }

        let int = |key: &str| info.get(key).and_then(Value::as_i64).unwrap_or(0);
        Some(TeamSummary {
            team_id,
            name: info
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            games_played: int("gamesPlayed"),
            points: int("points"),
            goals_for: int("goalsFor"),
            goals_against: int("goalsAgainst"),
        })
    }

    /// Roster + player record for every player of every team, keyed by team
    /// code in the order given.
    pub fn fetch_all_team_stats(&self, teams: &[String]) -> Map<String, Value> {
        let mut all = Map::new();

        for team in teams {
            self.reporter.info(&format!("Processing team: {team}"));
            let roster = self.get_team_roster(team);

            let mut team_stats = Vec::new();
            for stub in &roster {
                let Some(player_id) = stub.get("id").and_then(Value::as_i64) else {
                    continue;
                };
                let stats = self.get_player_stats(player_id);
                if !stats.is_empty() {
                    team_stats.push(Value::Object(stats));
                }
            }

            self.reporter
                .info(&format!("Processed {} players for {team}", team_stats.len()));
            all.insert(team.clone(), Value::Array(team_stats));
        }

        all
    }

    fn get_object(&self, url: &str) -> Result<RawRecord, AppError> {
        match self.get_json(url)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(RawRecord::new()),
            other => Err(AppError::new(
                ErrorKind::Data,
                format!("expected a JSON object, got {}", json_kind(&other)),
            )),
        }
    }

    fn get_json(&self, url: &str) -> Result<Value, AppError> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| AppError::new(ErrorKind::Network, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::new(
                ErrorKind::Network,
                format!("request failed with status {status} for url ({url})"),
            ));
        }

        resp.json::<Value>()
            .map_err(|e| AppError::new(ErrorKind::Data, format!("failed to decode JSON: {e}")))
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::{Route, serve};
    use super::*;
    use crate::logging::MemoryReporter;
    use tracing::Level;

    const ROSTER: &str = r#"{
        "forwards": [{"id": 1, "name": "Forward 1"}],
        "defensemen": [{"id": 2, "name": "Defense 1"}],
        "goalies": [{"id": 3, "name": "Goalie 1"}]
    }"#;

    const PLAYER: &str = r#"{
        "playerId": 1,
        "firstName": {"default": "John"},
        "lastName": {"default": "Doe"},
        "currentTeamAbbrev": "TOR"
    }"#;

    fn client(base: &str) -> (StatsClient, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        (StatsClient::with_base_url(base, reporter.clone()), reporter)
    }

    #[test]
    fn roster_concatenates_groups_in_order() {
        let (base, requests) = serve(vec![Route { path: "/roster/TOR/current", status: 200, body: ROSTER }]);
        let (client, reporter) = client(&base);

        let roster = client.get_team_roster("TOR");
        let ids: Vec<i64> = roster.iter().filter_map(|p| p.get("id")?.as_i64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(reporter
            .messages_at(Level::INFO)
            .contains(&"Found 3 players on TOR roster".to_string()));

        let head = requests.recv().unwrap().to_lowercase();
        assert!(head.starts_with("get /roster/tor/current"));
        assert!(head.contains("accept: application/json"));
    }

    #[test]
    fn server_error_degrades_to_empty_and_logs_once() {
        let (base, _requests) = serve(vec![
            Route { path: "/roster/TOR/current", status: 500, body: "{}" },
            Route { path: "/player/7/landing", status: 500, body: "{}" },
        ]);
        let (client, reporter) = client(&base);

        assert!(client.get_team_roster("TOR").is_empty());
        assert_eq!(reporter.messages_at(Level::ERROR).len(), 1);

        assert!(client.get_player_stats(7).is_empty());
        let errors = reporter.messages_at(Level::ERROR);
        assert_eq!(errors.len(), 2);
        assert!(errors[1].starts_with("Error fetching stats for player ID 7"));
    }

    #[test]
    fn undecodable_body_degrades_to_empty() {
        let (base, _requests) = serve(vec![Route { path: "/club-stats/team/10/now", status: 200, body: "not json" }]);
        let (client, reporter) = client(&base);

        assert!(client.get_team_info(10).is_empty());
        assert!(client.get_team_stats(10).is_none());
        assert_eq!(reporter.messages_at(Level::ERROR).len(), 2);
    }

    #[test]
    fn unreachable_host_degrades_to_empty() {
        // Port 9 on localhost is almost never listening; connection is refused.
        let (client, reporter) = client("http://127.0.0.1:9");
        assert!(client.get_team_schedule(10, "20232024").is_empty());
        assert_eq!(reporter.messages_at(Level::ERROR).len(), 1);
    }

    #[test]
    fn team_stats_defaults_missing_fields() {
        let (base, _requests) = serve(vec![Route {
            path: "/club-stats/team/10/now",
            status: 200,
            body: r#"{"name": "Toronto", "gamesPlayed": 82, "goalsFor": 300}"#,
        }]);
        let (client, _reporter) = client(&base);

        let summary = client.get_team_stats(10).unwrap();
        assert_eq!(summary.name, "Toronto");
        assert_eq!(summary.games_played, 82);
        assert_eq!(summary.goals_for, 300);
        assert_eq!(summary.points, 0);
    }

    #[test]
    fn schedule_reads_games_array() {
        let (base, _requests) = serve(vec![Route {
            path: "/club-schedule-season/10/20232024",
            status: 200,
            body: r#"{"games": [{"id": 1}, {"id": 2}]}"#,
        }]);
        let (client, _reporter) = client(&base);
        assert_eq!(client.get_team_schedule(10, "20232024").len(), 2);
    }

    #[test]
    fn fetch_all_skips_failed_players() {
        let (base, _requests) = serve(vec![
            Route { path: "/roster/TOR/current", status: 200, body: ROSTER },
            Route { path: "/player/1/landing", status: 200, body: PLAYER },
            Route { path: "/player/2/landing", status: 500, body: "{}" },
            Route { path: "/player/3/landing", status: 200, body: "{}" },
            Route { path: "/roster/FLA/current", status: 500, body: "{}" },
        ]);
        let (client, reporter) = client(&base);

        let all = client.fetch_all_team_stats(&["TOR".to_string(), "FLA".to_string()]);
        let keys: Vec<&String> = all.keys().collect();
        assert_eq!(keys, vec!["TOR", "FLA"]);
        assert_eq!(all["TOR"].as_array().map(Vec::len), Some(1));
        assert_eq!(all["FLA"].as_array().map(Vec::len), Some(0));
        assert!(reporter
            .messages_at(Level::INFO)
            .contains(&"Found stats for John Doe".to_string()));
    }
}
