#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use serde_json::json;

use footy_stats::parse::{parse_match_record, parse_match_records_json};
use footy_stats::records::MatchRecord;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

/// The four-team season in `season_matches.json`.
pub fn season() -> Vec<MatchRecord> {
    parse_match_records_json(&read_fixture("season_matches.json")).expect("fixture should parse")
}

pub fn find(matches: &[MatchRecord], id: u64) -> &MatchRecord {
    matches
        .iter()
        .find(|m| m.id == id)
        .expect("match should exist")
}

/// A minimal provider record with fixed corner and card counts.
pub fn record(id: u64, gw: u32, home: u32, away: u32, hg: u32, ag: u32, status: &str) -> MatchRecord {
    parse_match_record(&json!({
        "id": id,
        "homeID": home,
        "awayID": away,
        "home_name": format!("Team {home}"),
        "away_name": format!("Team {away}"),
        "status": status,
        "game_week": gw,
        "date_unix": 1_700_000_000 + i64::from(gw) * 604_800,
        "homeGoalCount": hg,
        "awayGoalCount": ag,
        "totalGoalCount": hg + ag,
        "team_a_corners": 6,
        "team_b_corners": 4,
        "team_a_cards_num": 2,
        "team_b_cards_num": 2,
    }))
    .expect("valid record")
}

pub fn complete(id: u64, gw: u32, home: u32, away: u32, hg: u32, ag: u32) -> MatchRecord {
    record(id, gw, home, away, hg, ag, "complete")
}

/// Ten gameweeks of team 1 v team 2, alternating venue. Team 1 scores `gw % 4`.
pub fn ten_week_pool() -> Vec<MatchRecord> {
    (1..=10u32)
        .map(|gw| {
            let (home, away) = if gw % 2 == 1 { (1, 2) } else { (2, 1) };
            let team1 = gw % 4;
            let (hg, ag) = if home == 1 { (team1, 1) } else { (1, team1) };
            complete(u64::from(gw), gw, home, away, hg, ag)
        })
        .collect()
}
