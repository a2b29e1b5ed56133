use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::app_cache_dir;
use crate::parse::{parse_league_table, parse_match_record, parse_player_record};
use crate::records::{LeagueTableRow, MatchRecord, PlayerRecord};
use crate::store::{LeagueScope, RecordStore};

/// SQLite-backed store. Raw provider JSON is kept per record and parsed on
/// load, so a parser change never needs a re-ingest.
pub struct SqliteStore {
    conn: Connection,
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub scope: Option<LeagueScope>,
    pub matches_upserted: usize,
    pub players_upserted: usize,
    pub table_rows: usize,
    pub skipped: Vec<String>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("footy_stats.sqlite"))
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Validates and upserts provider JSON. Records that fail to parse are
    /// skipped and listed in the summary.
    pub fn ingest_json(
        &mut self,
        scope: &LeagueScope,
        matches: Option<&Value>,
        players: Option<&Value>,
        table: Option<&Value>,
    ) -> Result<IngestSummary> {
        let mut summary = IngestSummary {
            scope: Some(scope.clone()),
            ..IngestSummary::default()
        };
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction().context("begin ingest transaction")?;

        for raw in matches.map(payload_items).unwrap_or_default() {
            match parse_match_record(raw) {
                Ok(m) => {
                    upsert_match(&tx, scope, &m, raw, &now)?;
                    summary.matches_upserted += 1;
                }
                Err(err) => {
                    warn!(%scope, %err, "skipping match");
                    summary.skipped.push(err.to_string());
                }
            }
        }
        for raw in players.map(payload_items).unwrap_or_default() {
            match parse_player_record(raw) {
                Ok(p) => {
                    upsert_player(&tx, scope, &p, raw, &now)?;
                    summary.players_upserted += 1;
                }
                Err(err) => {
                    warn!(%scope, %err, "skipping player");
                    summary.skipped.push(err.to_string());
                }
            }
        }
        if let Some(raw) = table {
            summary.table_rows = parse_league_table(raw).len();
            tx.execute(
                r#"
                INSERT INTO league_tables (league_key, season_id, raw_json, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(league_key, season_id) DO UPDATE SET
                    raw_json = excluded.raw_json,
                    updated_at = excluded.updated_at
                "#,
                params![scope.league_key, scope.season_id as i64, raw.to_string(), now],
            )
            .context("upsert league table")?;
        }

        tx.commit().context("commit ingest transaction")?;
        info!(
            %scope,
            matches = summary.matches_upserted,
            players = summary.players_upserted,
            skipped = summary.skipped.len(),
            "ingested"
        );
        Ok(summary)
    }

    pub fn scopes(&self) -> Result<Vec<LeagueScope>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT league_key, season_id FROM matches ORDER BY league_key, season_id",
            )
            .context("prepare scopes query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LeagueScope {
                    league_key: row.get(0)?,
                    season_id: row.get::<_, u32>(1)?,
                })
            })
            .context("query scopes")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode scope row")?);
        }
        Ok(out)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL").ok();
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            league_key TEXT NOT NULL,
            season_id INTEGER NOT NULL,
            match_id INTEGER NOT NULL,
            game_week INTEGER NULL,
            status TEXT NOT NULL,
            home_id INTEGER NOT NULL,
            away_id INTEGER NOT NULL,
            raw_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (league_key, season_id, match_id)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_week ON matches(league_key, season_id, game_week);
        CREATE TABLE IF NOT EXISTS players (
            league_key TEXT NOT NULL,
            season_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            club_team_id INTEGER NULL,
            raw_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (league_key, season_id, player_id)
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(league_key, season_id, club_team_id);
        CREATE TABLE IF NOT EXISTS league_tables (
            league_key TEXT NOT NULL,
            season_id INTEGER NOT NULL,
            raw_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (league_key, season_id)
        );
        "#,
    )
    .context("init sqlite schema")?;
    Ok(())
}

fn upsert_match(
    tx: &rusqlite::Transaction<'_>,
    scope: &LeagueScope,
    m: &MatchRecord,
    raw: &Value,
    now: &str,
) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            league_key, season_id, match_id, game_week, status,
            home_id, away_id, raw_json, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(league_key, season_id, match_id) DO UPDATE SET
            game_week = excluded.game_week,
            status = excluded.status,
            home_id = excluded.home_id,
            away_id = excluded.away_id,
            raw_json = excluded.raw_json,
            updated_at = excluded.updated_at
        "#,
        params![
            scope.league_key,
            scope.season_id as i64,
            m.id as i64,
            m.game_week.map(i64::from),
            m.status.as_str(),
            m.home_id as i64,
            m.away_id as i64,
            raw.to_string(),
            now,
        ],
    )
    .with_context(|| format!("upsert match {}", m.id))?;
    Ok(())
}

fn upsert_player(
    tx: &rusqlite::Transaction<'_>,
    scope: &LeagueScope,
    p: &PlayerRecord,
    raw: &Value,
    now: &str,
) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO players (
            league_key, season_id, player_id, club_team_id, raw_json, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(league_key, season_id, player_id) DO UPDATE SET
            club_team_id = excluded.club_team_id,
            raw_json = excluded.raw_json,
            updated_at = excluded.updated_at
        "#,
        params![
            scope.league_key,
            scope.season_id as i64,
            p.id as i64,
            p.club_team_id.map(i64::from),
            raw.to_string(),
            now,
        ],
    )
    .with_context(|| format!("upsert player {}", p.id))?;
    Ok(())
}

impl RecordStore for SqliteStore {
    fn matches(&self, scope: &LeagueScope) -> Result<Vec<MatchRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT raw_json FROM matches
                WHERE league_key = ?1 AND season_id = ?2
                ORDER BY game_week ASC, match_id ASC
                "#,
            )
            .context("prepare load matches query")?;
        let rows = stmt
            .query_map(params![scope.league_key, scope.season_id as i64], |row| {
                row.get::<_, String>(0)
            })
            .context("query load matches")?;

        let mut out = Vec::new();
        for row in rows {
            let raw = row.context("decode match row")?;
            let value: Value = serde_json::from_str(&raw).context("decode stored match json")?;
            out.push(parse_match_record(&value).context("parse stored match")?);
        }
        Ok(out)
    }

    fn players(&self, scope: &LeagueScope, team_id: Option<u32>) -> Result<Vec<PlayerRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT raw_json FROM players
                WHERE league_key = ?1 AND season_id = ?2
                  AND (?3 IS NULL OR club_team_id = ?3)
                ORDER BY player_id ASC
                "#,
            )
            .context("prepare load players query")?;
        let rows = stmt
            .query_map(
                params![
                    scope.league_key,
                    scope.season_id as i64,
                    team_id.map(i64::from)
                ],
                |row| row.get::<_, String>(0),
            )
            .context("query load players")?;

        let mut out = Vec::new();
        for row in rows {
            let raw = row.context("decode player row")?;
            let value: Value = serde_json::from_str(&raw).context("decode stored player json")?;
            out.push(parse_player_record(&value).context("parse stored player")?);
        }
        Ok(out)
    }

    fn league_table(&self, scope: &LeagueScope) -> Result<Vec<LeagueTableRow>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT raw_json FROM league_tables WHERE league_key = ?1 AND season_id = ?2",
                params![scope.league_key, scope.season_id as i64],
                |row| row.get(0),
            )
            .optional()
            .context("query league table")?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        let value: Value = serde_json::from_str(&raw).context("decode stored league table")?;
        Ok(parse_league_table(&value))
    }
}

fn payload_items(v: &Value) -> Vec<&Value> {
    v.as_array()
        .or_else(|| v.get("data").and_then(|x| x.as_array()))
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

/// Reads a provider export from disk for ingestion.
pub fn read_json_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| anyhow!("parse {}: {err}", path.display()))
}
