mod common;

use serde_json::json;

use common::{find, read_fixture, season};
use footy_stats::StatsError;
use footy_stats::parse::{
    parse_league_table_json, parse_match_record, parse_match_records_json, parse_players_json,
};
use footy_stats::records::{CardKind, GoalKind, MatchStatus, QualityLevel};

#[test]
fn parses_season_fixture() {
    let matches = season();
    assert_eq!(matches.len(), 11);

    let opener = find(&matches, 101);
    assert_eq!(opener.home_id, 1);
    assert_eq!(opener.away_id, 2);
    assert_eq!(opener.game_week, Some(1));
    assert_eq!(opener.status, MatchStatus::Complete);
    assert_eq!(opener.score(), Some((2, 1)));
    assert_eq!(opener.total_goals, Some(3));
    assert_eq!(opener.competition.as_deref(), Some("9001"));
    assert_eq!(opener.team_a.stats.corners, Some(5));
    assert_eq!(opener.team_b.stats.shots_on_target, Some(3));
    assert_eq!(opener.quality.corners, QualityLevel::Full);
    assert_eq!(opener.quality.cards, QualityLevel::Partial);
    assert_eq!(opener.quality.attacks, QualityLevel::Absent);
}

#[test]
fn unrecorded_stats_are_absent() {
    let matches = season();
    let m = find(&matches, 102);
    assert_eq!(m.team_a.stats.corners, None);
    assert_eq!(m.team_b.stats.corners, None);
    assert_eq!(m.team_a.stats.cards, Some(2));
    assert_eq!(m.quality.corners, QualityLevel::Absent);
}

#[test]
fn knockout_tie_has_no_gameweek() {
    let matches = season();
    let cup = find(&matches, 900);
    assert_eq!(cup.game_week, None);
    assert_eq!(cup.competition.as_deref(), Some("cup"));
}

#[test]
fn parses_match_details() {
    let matches = season();
    let m = find(&matches, 301);
    assert_eq!(m.team_a.lineup.len(), 3);
    assert_eq!(m.team_a.lineup[1].events[0].minute, Some(33));
    assert_eq!(m.team_a.bench.len(), 2);
    assert_eq!(m.team_a.bench[0].player_out, Some(1003));
    assert_eq!(m.team_a.bench[0].minute, Some(60));
    assert_eq!(m.team_a.bench[1].player_out, None);

    assert_eq!(m.team_a.goals.len(), 3);
    assert_eq!(m.team_a.goals[0].assist_player_id, None);
    assert_eq!(m.team_a.goals[1].kind, GoalKind::Penalty);
    assert_eq!(m.team_a.goals[2].assist_player_id, Some(1001));
    assert_eq!(m.team_b.cards[1].kind, CardKind::SecondYellow);
    assert_eq!(m.team_b.cards[1].minute, Some(70));

    let with_h2h = find(&matches, 401);
    let h2h = with_h2h.h2h.as_ref().expect("h2h block");
    assert_eq!(h2h.team_a_wins, 1);
    assert_eq!(h2h.total_matches, 1);
    assert_eq!(h2h.avg_goals, Some(2.0));
}

#[test]
fn postponed_and_fixture_statuses() {
    let matches = season();
    assert_eq!(find(&matches, 302).status, MatchStatus::Postponed);
    assert_eq!(find(&matches, 501).status, MatchStatus::Incomplete);
}

#[test]
fn rejects_goal_total_mismatch() {
    let v = json!({"id": 7, "homeID": 1, "awayID": 2, "status": "complete",
        "homeGoalCount": 2, "awayGoalCount": 1, "totalGoalCount": 4});
    let err = parse_match_record(&v).unwrap_err();
    assert!(matches!(
        err,
        StatsError::MalformedRecord {
            match_id: Some(7),
            ..
        }
    ));
}

#[test]
fn oversized_goal_counts_are_malformed() {
    // 4e9 + 4e9 wraps to this total in u32.
    let v = json!({"id": 9, "homeID": 1, "awayID": 2, "status": "complete",
        "homeGoalCount": 4_000_000_000u64, "awayGoalCount": 4_000_000_000u64,
        "totalGoalCount": 3_705_032_704u64});
    assert!(matches!(
        parse_match_record(&v),
        Err(StatsError::MalformedRecord {
            match_id: Some(9),
            ..
        })
    ));
}

#[test]
fn complete_match_needs_a_score() {
    let v = json!({"id": 8, "homeID": 1, "awayID": 2, "status": "complete",
        "homeGoalCount": -1, "awayGoalCount": 1});
    assert_eq!(
        parse_match_record(&v),
        Err(StatsError::MissingScore { match_id: 8 })
    );
}

#[test]
fn rejects_missing_identity_and_unknown_status() {
    let no_away = json!({"id": 9, "homeID": 1, "status": "complete"});
    assert!(parse_match_record(&no_away).is_err());

    let weird = json!({"id": 10, "homeID": 1, "awayID": 2, "status": "abandoned"});
    let err = parse_match_record(&weird).unwrap_err();
    assert!(err.to_string().contains("unknown status"));
}

#[test]
fn null_payload_is_empty() {
    assert!(parse_match_records_json("null").unwrap().is_empty());
    assert!(parse_match_records_json("{\"data\": 3}").is_err());
}

#[test]
fn parses_players_fixture() {
    let players = parse_players_json(&read_fixture("players.json")).expect("fixture should parse");
    assert_eq!(players.len(), 5);
    assert_eq!(players[0].name, "Nine");
    // Empty known_as falls back to the full name.
    assert_eq!(players[1].name, "Sam Six");
    assert_eq!(players[1].cards, 6);
    assert_eq!(players[4].minutes, 0);
    assert_eq!(players[3].club_team_id, Some(4));
}

#[test]
fn league_table_merges_groups_without_duplicates() {
    let rows = parse_league_table_json(&read_fixture("league_table.json")).expect("table parses");
    let ids: Vec<u32> = rows.iter().map(|r| r.team_id).collect();
    assert_eq!(ids, vec![1, 3, 2, 4]);
    assert_eq!(rows[0].points, 10);
    assert_eq!(rows[0].goal_difference, 5);
    assert_eq!(rows[2].position, Some(3));
}

#[test]
fn derived_goal_difference_saturates() {
    let raw = json!({"league_table": [
        {"id": 1, "name": "Alpha", "seasonGoals": 4_000_000_000u64, "seasonConceded": 0},
        {"id": 2, "name": "Bravo", "seasonGoals": 3, "seasonConceded": 5},
    ]})
    .to_string();
    let rows = parse_league_table_json(&raw).unwrap();
    assert_eq!(rows[0].goal_difference, i32::MAX);
    assert_eq!(rows[1].goal_difference, -2);
}
