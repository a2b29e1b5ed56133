mod common;

use serde_json::{Value, json};

use common::{fixture_path, read_fixture};
use footy_stats::sqlite_store::SqliteStore;
use footy_stats::store::{LeagueScope, MemoryStore, RecordStore};

fn fixture_value(name: &str) -> Value {
    serde_json::from_str(&read_fixture(name)).expect("fixture json")
}

#[test]
fn memory_store_loads_exports() {
    let scope = LeagueScope::new("test-league", 2024);
    let store = MemoryStore::from_json_files(
        &scope,
        &fixture_path("season_matches.json"),
        Some(fixture_path("players.json").as_path()),
        Some(fixture_path("league_table.json").as_path()),
    )
    .unwrap();

    assert_eq!(store.matches(&scope).unwrap().len(), 11);
    assert_eq!(store.players(&scope, None).unwrap().len(), 5);
    assert_eq!(store.players(&scope, Some(4)).unwrap().len(), 2);
    assert_eq!(store.league_table(&scope).unwrap().len(), 4);

    let other = LeagueScope::new("test-league", 2023);
    assert!(store.matches(&other).unwrap().is_empty());
}

#[test]
fn sqlite_round_trip() {
    let scope = LeagueScope::new("test-league", 2024);
    let mut store = SqliteStore::open_in_memory().unwrap();
    let summary = store
        .ingest_json(
            &scope,
            Some(&fixture_value("season_matches.json")),
            Some(&fixture_value("players.json")),
            Some(&fixture_value("league_table.json")),
        )
        .unwrap();
    assert_eq!(summary.matches_upserted, 11);
    assert_eq!(summary.players_upserted, 5);
    assert_eq!(summary.table_rows, 4);
    assert!(summary.skipped.is_empty());

    let matches = store.matches(&scope).unwrap();
    assert_eq!(matches.len(), 11);
    let detailed = matches.iter().find(|m| m.id == 301).unwrap();
    assert_eq!(detailed.team_a.goals.len(), 3);

    let squad = store.players(&scope, Some(1)).unwrap();
    let ids: Vec<u32> = squad.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1001, 1002, 1004]);
    assert_eq!(store.league_table(&scope).unwrap()[0].team_id, 1);
    assert_eq!(store.scopes().unwrap(), vec![scope]);
}

#[test]
fn sqlite_upserts_and_skips_bad_records() {
    let scope = LeagueScope::new("test-league", 2024);
    let mut store = SqliteStore::open_in_memory().unwrap();
    let first = json!([{
        "id": 5, "homeID": 1, "awayID": 2, "status": "incomplete", "game_week": 1,
        "homeGoalCount": 0, "awayGoalCount": 0,
    }]);
    store.ingest_json(&scope, Some(&first), None, None).unwrap();

    let update = json!({"data": [
        {"id": 5, "homeID": 1, "awayID": 2, "status": "complete", "game_week": 1,
         "homeGoalCount": 2, "awayGoalCount": 0, "totalGoalCount": 2},
        {"id": 6, "homeID": 3, "awayID": 3, "status": "complete"},
    ]});
    let summary = store.ingest_json(&scope, Some(&update), None, None).unwrap();
    assert_eq!(summary.matches_upserted, 1);
    assert_eq!(summary.skipped.len(), 1);

    let matches = store.matches(&scope).unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].is_complete());
    assert_eq!(matches[0].score(), Some((2, 0)));
    assert!(store.league_table(&scope).unwrap().is_empty());
}

#[test]
fn sqlite_open_reports_unusable_directory() {
    let blocker = std::env::temp_dir().join(format!("footy_stats_blocker_{}", std::process::id()));
    std::fs::write(&blocker, b"not a directory").unwrap();
    let err = match SqliteStore::open(&blocker.join("nested").join("db.sqlite")) {
        Ok(_) => panic!("a file cannot hold a database directory"),
        Err(err) => err,
    };
    std::fs::remove_file(&blocker).ok();
    assert!(err.to_string().starts_with("create db dir"), "{err:#}");
}
