use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use footy_stats::aggregate::{TeamSplits, aggregate_splits};
use footy_stats::config::{self, Settings};
use footy_stats::filter::{Cutoff, matches_involving, next_gameweek, select_complete, select_eligible};
use footy_stats::form::{FormSummary, form_summary, last_meeting};
use footy_stats::player::{PlayerMetric, top_performers};
use footy_stats::records::{MatchRecord, MatchStatus};
use footy_stats::report;
use footy_stats::sqlite_store::{self, SqliteStore};
use footy_stats::store::{LeagueScope, MemoryStore, RecordStore};

#[derive(Debug, Serialize)]
struct TeamReport<'a> {
    scope: &'a LeagueScope,
    as_of_gameweek: u32,
    splits: TeamSplits,
    form: FormSummary,
    next_opponent: Option<u32>,
    last_meeting: Option<&'a MatchRecord>,
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();
    let settings = Settings::from_env();

    let team_id = parse_u32_arg("--team").context("--team <id> is required")?;
    let league_key = parse_string_arg("--league")
        .or_else(|| settings.league_key.clone())
        .unwrap_or_else(|| "league".to_string());
    let season_id = parse_u32_arg("--season")
        .or(settings.season_id)
        .unwrap_or(0);
    let scope = LeagueScope::new(league_key, season_id);
    let store = open_store(&scope, &settings)?;

    let matches = store.matches(&scope)?;
    if !matches.iter().any(|m| m.involves(team_id)) {
        return Err(anyhow!("team {team_id} has no matches in {scope}"));
    }
    let as_of = parse_u32_arg("--gw").unwrap_or_else(|| next_gameweek(&matches));
    let competition = parse_string_arg("--competition");

    let partition = select_eligible(&matches, Cutoff::Gameweek(as_of));
    let history = matches_involving(team_id, select_complete(partition.eligible));
    let splits = aggregate_splits(team_id, history.iter().copied(), competition.as_deref())?;
    let form = form_summary(team_id, history.iter().copied())?;

    let next_fixture = matches
        .iter()
        .filter(|m| m.involves(team_id) && m.status == MatchStatus::Incomplete)
        .filter(|m| m.game_week.is_some_and(|gw| gw >= as_of))
        .min_by_key(|m| (m.game_week, m.id));
    let next_opponent =
        next_fixture.map(|m| if m.home_id == team_id { m.away_id } else { m.home_id });
    let meeting =
        next_opponent.and_then(|opp| last_meeting(team_id, opp, history.iter().copied()));

    if has_flag("--json") {
        let out = TeamReport {
            scope: &scope,
            as_of_gameweek: as_of,
            splits,
            form,
            next_opponent,
            last_meeting: meeting,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("serialize team report")?
        );
        return Ok(());
    }

    println!("{scope} before GW{as_of}");
    println!();
    println!("{}", report::render_team_report(&splits, Some(&form)));
    if let Some(m) = meeting {
        println!();
        println!("{}", report::render_meeting(m, team_id));
    }

    let players = store.players(&scope, Some(team_id))?;
    if !players.is_empty() {
        println!();
        for (title, metric) in [
            ("Top scorers", PlayerMetric::Goals),
            ("Goals per 90", PlayerMetric::GoalsPer90),
            ("Cards per 90", PlayerMetric::CardsPer90),
        ] {
            let ranked = top_performers(&players, metric, 5, settings.min_player_minutes);
            println!("{}", report::render_top_players(title, &ranked));
        }
    }

    let table = store.league_table(&scope)?;
    if let Some(row) = table.iter().find(|r| r.team_id == team_id) {
        println!();
        println!(
            "Table: {} | P{} GF{} GA{} GD{:+} Pts{}",
            row.position
                .map(|p| format!("#{p}"))
                .unwrap_or_else(|| "-".to_string()),
            row.played,
            row.goals_for,
            row.goals_against,
            row.goal_difference,
            row.points
        );
    }
    Ok(())
}

fn open_store(scope: &LeagueScope, settings: &Settings) -> Result<Box<dyn RecordStore>> {
    if let Some(path) = parse_string_arg("--matches") {
        let players = parse_string_arg("--players").map(PathBuf::from);
        let table = parse_string_arg("--table").map(PathBuf::from);
        let store = MemoryStore::from_json_files(
            scope,
            &PathBuf::from(path),
            players.as_deref(),
            table.as_deref(),
        )?;
        return Ok(Box::new(store));
    }
    let db_path = parse_string_arg("--db")
        .map(PathBuf::from)
        .or_else(|| settings.db_path.clone())
        .or_else(sqlite_store::default_db_path)
        .context("unable to resolve sqlite path")?;
    Ok(Box::new(SqliteStore::open(&db_path)?))
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

fn parse_u32_arg(name: &str) -> Option<u32> {
    parse_string_arg(name).and_then(|raw| raw.parse::<u32>().ok())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
