//! Static team catalog: abbreviation → numeric team id.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub abbrev: &'static str,
    pub id: u32,
    pub name: &'static str,
}

pub static TEAMS: [Team; 8] = [
    Team { abbrev: "TOR", id: 10, name: "Toronto Maple Leafs" },
    Team { abbrev: "FLA", id: 13, name: "Florida Panthers" },
    Team { abbrev: "BOS", id: 6, name: "Boston Bruins" },
    Team { abbrev: "TBL", id: 14, name: "Tampa Bay Lightning" },
    Team { abbrev: "MTL", id: 8, name: "Montreal Canadiens" },
    Team { abbrev: "OTT", id: 9, name: "Ottawa Senators" },
    Team { abbrev: "BUF", id: 7, name: "Buffalo Sabres" },
    Team { abbrev: "DET", id: 17, name: "Detroit Red Wings" },
];

/// Teams fetched and kept when nothing else is configured.
pub const DEFAULT_TEAMS: [&str; 2] = ["TOR", "FLA"];

/// Case-insensitive lookup.
pub fn team_by_abbrev(abbrev: &str) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.abbrev.eq_ignore_ascii_case(abbrev.trim()))
}

pub fn default_teams() -> Vec<String> {
    DEFAULT_TEAMS.iter().map(|t| t.to_string()).collect()
}
