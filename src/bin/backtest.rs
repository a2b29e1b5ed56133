use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use tracing::info;

use footy_stats::backtest::{BacktestSummary, Configured};
use footy_stats::config::{self, Settings};
use footy_stats::filter::completed_gameweeks;
use footy_stats::predict::{PredictorConfig, ThresholdPredictor};
use footy_stats::records::{MatchRecord, PlayerRecord};
use footy_stats::report;
use footy_stats::sqlite_store::{self, SqliteStore};
use footy_stats::store::{LeagueScope, MemoryStore, RecordStore};

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let settings = Settings::from_env();

    let league_key = parse_string_arg("--league")
        .or_else(|| settings.league_key.clone())
        .unwrap_or_else(|| "league".to_string());
    let season_id = parse_u32_arg("--season")
        .or(settings.season_id)
        .unwrap_or(0);
    let scope = LeagueScope::new(league_key, season_id);

    let (matches, players) = load_records(&scope, &settings)?;
    if matches.is_empty() {
        return Err(anyhow!("no matches found for {scope}"));
    }

    let cutoffs = resolve_cutoffs(&matches);
    if cutoffs.is_empty() {
        return Err(anyhow!("no gameweeks to backtest for {scope}"));
    }
    let team_ids = parse_ids_arg("--teams").unwrap_or_default();

    let mut predictor_config = match parse_string_arg("--config") {
        Some(path) => PredictorConfig::from_json_file(&PathBuf::from(path))?,
        None => PredictorConfig::default(),
    };
    predictor_config.min_matches = parse_u32_arg("--min-matches").unwrap_or(settings.min_matches);
    predictor_config.min_player_minutes = settings.min_player_minutes;
    let predictor = ThresholdPredictor::new(predictor_config);

    let positions: BTreeMap<u32, _> = players.iter().map(|p| (p.id, p.position_group())).collect();
    let player_names: BTreeMap<u32, String> =
        players.iter().map(|p| (p.id, p.name.clone())).collect();

    info!(%scope, cutoffs = ?cutoffs, teams = ?team_ids, "running backtest");
    let run_all = || {
        cutoffs
            .par_iter()
            .map(|cutoff| {
                Configured::new(&matches, *cutoff, &team_ids)
                    .with_positions(positions.clone())
                    .filter()
                    .aggregate()
                    .map(|stage| stage.predict(&predictor).evaluate())
            })
            .collect::<Result<Vec<_>, _>>()
    };
    let runs = match build_pool(settings.parallelism) {
        Some(pool) => pool.install(run_all),
        None => run_all(),
    }
    .context("backtest failed")?;
    let summary = BacktestSummary::from_runs(runs);

    if has_flag("--json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize backtest summary")?
        );
    } else {
        println!("Backtest {scope}");
        println!("Gameweeks: {:?}", cutoffs);
        println!();
        println!("{}", report::render_backtest_report(&summary, &player_names));
    }

    if let Some(path) = parse_string_arg("--xlsx") {
        let path = PathBuf::from(path);
        let export = report::export_backtest_xlsx(&path, &summary, &player_names)?;
        eprintln!(
            "Wrote {} ({} runs, {} predictions)",
            path.display(),
            export.runs,
            export.evaluations
        );
    }
    Ok(())
}

fn load_records(
    scope: &LeagueScope,
    settings: &Settings,
) -> Result<(Vec<MatchRecord>, Vec<PlayerRecord>)> {
    if let Some(path) = parse_string_arg("--matches") {
        let players_path = parse_string_arg("--players").map(PathBuf::from);
        let store =
            MemoryStore::from_json_files(scope, &PathBuf::from(path), players_path.as_deref(), None)?;
        return Ok((store.matches(scope)?, store.players(scope, None)?));
    }

    let db_path = parse_db_path_arg()
        .or_else(|| settings.db_path.clone())
        .or_else(sqlite_store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let store = SqliteStore::open(&db_path)?;
    Ok((store.matches(scope)?, store.players(scope, None)?))
}

/// `--gw`, then `--gws`, then `--from/--to`, else every completed gameweek
/// after the first.
fn resolve_cutoffs(matches: &[MatchRecord]) -> Vec<u32> {
    if let Some(gw) = parse_u32_arg("--gw") {
        return vec![gw];
    }
    if let Some(ids) = parse_ids_arg("--gws") {
        return ids;
    }
    let completed = completed_gameweeks(matches);
    let from = parse_u32_arg("--from").unwrap_or(2).max(1);
    let to = parse_u32_arg("--to")
        .or_else(|| completed.iter().next_back().copied())
        .unwrap_or(0);
    completed
        .into_iter()
        .filter(|gw| *gw >= from && *gw <= to)
        .collect()
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_string_arg("--db").map(PathBuf::from)
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
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_u32_arg(name: &str) -> Option<u32> {
    parse_string_arg(name).and_then(|raw| raw.parse::<u32>().ok())
}

fn parse_ids_arg(name: &str) -> Option<Vec<u32>> {
    let ids = parse_ids(&parse_string_arg(name)?);
    (!ids.is_empty()).then_some(ids)
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn parse_ids(raw: &str) -> Vec<u32> {
    let ids = raw
        .split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .filter(|id| *id != 0)
        .collect::<Vec<_>>();
    dedup_ids(ids)
}

fn dedup_ids(ids: Vec<u32>) -> Vec<u32> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if seen.insert(id) {
            out.push(id);
        }
    }
    out
}
