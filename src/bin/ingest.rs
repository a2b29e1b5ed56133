use std::path::PathBuf;

use anyhow::{Context, Result};

use footy_stats::config::{self, Settings};
use footy_stats::sqlite_store::{self, SqliteStore, read_json_file};
use footy_stats::store::LeagueScope;

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let settings = Settings::from_env();

    let league_key = parse_string_arg("--league")
        .or_else(|| settings.league_key.clone())
        .context("--league <key> is required")?;
    let season_id = parse_string_arg("--season")
        .and_then(|raw| raw.parse::<u32>().ok())
        .or(settings.season_id)
        .context("--season <id> is required")?;
    let scope = LeagueScope::new(league_key, season_id);

    let db_path = parse_string_arg("--db")
        .map(PathBuf::from)
        .or_else(|| settings.db_path.clone())
        .or_else(sqlite_store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let matches = parse_string_arg("--matches")
        .map(|p| read_json_file(&PathBuf::from(p)))
        .transpose()?;
    let players = parse_string_arg("--players")
        .map(|p| read_json_file(&PathBuf::from(p)))
        .transpose()?;
    let table = parse_string_arg("--table")
        .map(|p| read_json_file(&PathBuf::from(p)))
        .transpose()?;

    let mut store = SqliteStore::open(&db_path)?;
    let summary = store.ingest_json(&scope, matches.as_ref(), players.as_ref(), table.as_ref())?;

    println!("Ingest complete");
    println!("DB: {}", db_path.display());
    println!("Scope: {scope}");
    println!("Matches upserted: {}", summary.matches_upserted);
    println!("Players upserted: {}", summary.players_upserted);
    println!("League table rows: {}", summary.table_rows);
    if !summary.skipped.is_empty() {
        println!("Skipped {} records:", summary.skipped.len());
        for reason in summary.skipped.iter().take(20) {
            println!("  - {reason}");
        }
    }
    let scopes = store.scopes()?;
    println!(
        "Seasons stored: {}",
        scopes
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
