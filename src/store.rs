use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::parse::{parse_league_table_json, parse_match_records_json, parse_players_json};
use crate::records::{LeagueTableRow, MatchRecord, PlayerRecord};

/// Addresses one league season in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LeagueScope {
    pub league_key: String,
    pub season_id: u32,
}

impl LeagueScope {
    pub fn new(league_key: impl Into<String>, season_id: u32) -> Self {
        Self {
            league_key: league_key.into(),
            season_id,
        }
    }
}

impl std::fmt::Display for LeagueScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.league_key, self.season_id)
    }
}

/// Read-only source of parsed records. Callers load once per run and hand
/// the slices to the pure pipeline.
pub trait RecordStore {
    fn matches(&self, scope: &LeagueScope) -> Result<Vec<MatchRecord>>;

    /// Players of `team_id`, or the whole league when `team_id` is `None`.
    fn players(&self, scope: &LeagueScope, team_id: Option<u32>) -> Result<Vec<PlayerRecord>>;

    fn league_table(&self, scope: &LeagueScope) -> Result<Vec<LeagueTableRow>>;
}

#[derive(Debug, Clone, Default)]
struct SeasonData {
    matches: Vec<MatchRecord>,
    players: Vec<PlayerRecord>,
    table: Vec<LeagueTableRow>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    seasons: HashMap<LeagueScope, SeasonData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_matches(&mut self, scope: &LeagueScope, matches: Vec<MatchRecord>) {
        self.seasons
            .entry(scope.clone())
            .or_default()
            .matches
            .extend(matches);
    }

    pub fn insert_players(&mut self, scope: &LeagueScope, players: Vec<PlayerRecord>) {
        self.seasons
            .entry(scope.clone())
            .or_default()
            .players
            .extend(players);
    }

    pub fn set_league_table(&mut self, scope: &LeagueScope, table: Vec<LeagueTableRow>) {
        self.seasons.entry(scope.clone()).or_default().table = table;
    }

    /// Loads provider JSON exports. `players` and `table` are optional.
    pub fn from_json_files(
        scope: &LeagueScope,
        matches: &Path,
        players: Option<&Path>,
        table: Option<&Path>,
    ) -> Result<Self> {
        let mut store = Self::new();
        let raw = std::fs::read_to_string(matches)
            .with_context(|| format!("read matches {}", matches.display()))?;
        let parsed = parse_match_records_json(&raw)
            .with_context(|| format!("parse matches {}", matches.display()))?;
        store.insert_matches(scope, parsed);

        if let Some(path) = players {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read players {}", path.display()))?;
            let parsed = parse_players_json(&raw)
                .with_context(|| format!("parse players {}", path.display()))?;
            store.insert_players(scope, parsed);
        }
        if let Some(path) = table {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read league table {}", path.display()))?;
            let parsed = parse_league_table_json(&raw)
                .with_context(|| format!("parse league table {}", path.display()))?;
            store.set_league_table(scope, parsed);
        }
        Ok(store)
    }
}

impl RecordStore for MemoryStore {
    fn matches(&self, scope: &LeagueScope) -> Result<Vec<MatchRecord>> {
        Ok(self
            .seasons
            .get(scope)
            .map(|s| s.matches.clone())
            .unwrap_or_default())
    }

    fn players(&self, scope: &LeagueScope, team_id: Option<u32>) -> Result<Vec<PlayerRecord>> {
        let Some(season) = self.seasons.get(scope) else {
            return Ok(Vec::new());
        };
        Ok(season
            .players
            .iter()
            .filter(|p| team_id.is_none() || p.club_team_id == team_id)
            .cloned()
            .collect())
    }

    fn league_table(&self, scope: &LeagueScope) -> Result<Vec<LeagueTableRow>> {
        Ok(self
            .seasons
            .get(scope)
            .map(|s| s.table.clone())
            .unwrap_or_default())
    }
}
