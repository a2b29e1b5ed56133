mod common;

use serde_json::json;

use common::{complete, find, season};
use footy_stats::StatsError;
use footy_stats::aggregate::{AggregateScope, Venue, aggregate, aggregate_splits};
use footy_stats::filter::{Cutoff, matches_involving, select_complete, select_eligible};
use footy_stats::normalize::{MatchResult, Orientation, team_view};
use footy_stats::parse::parse_match_record;
use footy_stats::records::{MatchRecord, StatKind};

fn history(pool: &[MatchRecord], team_id: u32, gw: u32) -> Vec<&MatchRecord> {
    let part = select_eligible(pool, Cutoff::Gameweek(gw));
    matches_involving(team_id, select_complete(part.eligible))
}

#[test]
fn views_are_symmetric() {
    let pool = season();
    for m in pool.iter().filter(|m| m.is_complete()) {
        let home = team_view(m, m.home_id).unwrap();
        let away = team_view(m, m.away_id).unwrap();
        assert_eq!(home.orientation, Orientation::Home);
        assert_eq!(home.orientation.flip(), away.orientation);
        assert_eq!(home.own_stats(), away.opponent_stats());
        assert_eq!(home.opponent_stats(), away.own_stats());
        assert_eq!(home.goals_for(), away.goals_against());
        assert_eq!(home.opponent_id(), m.away_id);
        let pair = (home.result().unwrap(), away.result().unwrap());
        assert!(matches!(
            pair,
            (MatchResult::Win, MatchResult::Loss)
                | (MatchResult::Draw, MatchResult::Draw)
                | (MatchResult::Loss, MatchResult::Win)
        ));
    }
}

#[test]
fn view_rejects_non_participant() {
    let pool = season();
    let m = find(&pool, 101);
    let err = team_view(m, 3).unwrap_err();
    assert_eq!(
        err,
        StatsError::UnknownTeam {
            team_id: 3,
            match_id: 101
        }
    );
    assert!(aggregate(3, [m], &AggregateScope::all()).is_err());
}

#[test]
fn goals_before_cutoff() {
    let pool = vec![
        complete(1, 1, 1, 2, 2, 0),
        complete(2, 2, 3, 1, 1, 1),
        complete(3, 3, 1, 4, 3, 2),
        complete(4, 4, 1, 2, 5, 0),
        complete(5, 5, 2, 1, 0, 5),
    ];
    let agg = aggregate(1, history(&pool, 1, 4), &AggregateScope::all()).unwrap();
    assert_eq!(agg.matches_played(), 3);
    assert_eq!(agg.counts.goals_scored, 6);
    assert_eq!(agg.rates.unwrap().goals_per_match, 2.0);
    assert_eq!(agg.match_ids, vec![1, 2, 3]);
}

#[test]
fn fixture_team_figures() {
    let pool = season();
    let agg = aggregate(1, history(&pool, 1, 5), &AggregateScope::all()).unwrap();
    assert_eq!(agg.team_name.as_deref(), Some("Alpha FC"));
    assert_eq!(agg.counts.played, 4);
    assert_eq!((agg.counts.won, agg.counts.drawn, agg.counts.lost), (3, 1, 0));
    assert_eq!(agg.counts.points, 10);
    assert_eq!(agg.counts.goals_scored, 8);
    assert_eq!(agg.counts.goals_conceded, 3);
    assert_eq!(agg.counts.clean_sheets, 1);
    assert_eq!(agg.counts.btts, 3);
    assert_eq!(agg.counts.over_25, 2);

    let rates = agg.rates.unwrap();
    assert_eq!(rates.points_per_game, 2.5);
    assert_eq!(rates.conceded_per_match, 0.75);
    assert_eq!(rates.win_pct, 75.0);
    assert_eq!(rates.btts_pct, 75.0);
    assert_eq!(rates.over_25_pct, 50.0);

    let corners = agg.own[&StatKind::Corners];
    assert_eq!(corners.observed, 4);
    assert_eq!(corners.total, 26.0);
    assert_eq!(corners.average, Some(6.5));
    assert_eq!((corners.min, corners.max), (Some(5.0), Some(8.0)));
    assert_eq!(agg.opponent_average(StatKind::Corners), Some(3.5));
    assert_eq!(agg.match_total_average(StatKind::Corners), Some(10.0));
    assert_eq!(agg.own_average(StatKind::Possession), Some(52.5));
    assert!(!agg.match_totals.contains_key(&StatKind::Possession));
    assert_eq!(agg.quality.len(), 4);
}

#[test]
fn averages_divide_by_recorded_matches() {
    let pool = season();
    let agg = aggregate(3, history(&pool, 3, 5), &AggregateScope::all()).unwrap();
    assert_eq!(agg.matches_played(), 4);
    let corners = agg.own[&StatKind::Corners];
    assert_eq!(corners.observed, 3);
    assert_eq!(corners.average, Some(4.0));
    assert_eq!(agg.own[&StatKind::Cards].observed, 4);
}

#[test]
fn postponed_matches_never_count() {
    let pool = season();
    let training = history(&pool, 2, 5);
    assert!(training.iter().all(|m| m.id != 302));
    let agg = aggregate(2, training, &AggregateScope::all()).unwrap();
    assert_eq!(agg.matches_played(), 3);
    assert_eq!(agg.match_ids, vec![101, 201, 402]);
}

#[test]
fn unscored_matches_are_skipped() {
    let pending = parse_match_record(&json!({
        "id": 77, "homeID": 1, "awayID": 2, "status": "incomplete", "game_week": 2,
        "homeGoalCount": -1, "awayGoalCount": -1,
    }))
    .unwrap();
    let played = complete(76, 1, 2, 1, 0, 0);
    let agg = aggregate(1, [&played, &pending], &AggregateScope::all()).unwrap();
    assert_eq!(agg.matches_played(), 1);
    assert_eq!(agg.skipped_unscored, vec![77]);
    assert_eq!(agg.counts.clean_sheets, 1);
    assert_eq!(agg.counts.failed_to_score, 1);
}

#[test]
fn aggregation_is_pure_and_order_free() {
    let pool = season();
    let training = history(&pool, 1, 5);
    let first = aggregate(1, training.iter().copied(), &AggregateScope::all()).unwrap();
    let again = aggregate(1, training.iter().copied(), &AggregateScope::all()).unwrap();
    assert_eq!(first, again);

    let reversed = aggregate(1, training.iter().rev().copied(), &AggregateScope::all()).unwrap();
    assert_eq!(first.counts, reversed.counts);
    assert_eq!(first.rates, reversed.rates);
    assert_eq!(first.own, reversed.own);
    assert_eq!(first.match_totals, reversed.match_totals);
}

#[test]
fn empty_history_is_a_sentinel() {
    let agg = aggregate(1, std::iter::empty(), &AggregateScope::all()).unwrap();
    assert!(agg.is_empty());
    assert!(agg.rates.is_none());
    assert!(agg.own.is_empty());
    assert_eq!(agg.own_average(StatKind::Goals), None);

    // Zero goals over played matches is data, not absence.
    let shut_out = complete(1, 1, 1, 2, 0, 3);
    let agg = aggregate(1, [&shut_out], &AggregateScope::all()).unwrap();
    assert!(!agg.is_empty());
    assert_eq!(agg.rates.unwrap().goals_per_match, 0.0);
}

#[test]
fn venue_splits_partition_the_history() {
    let pool = season();
    let splits = aggregate_splits(1, history(&pool, 1, 5), None).unwrap();
    assert_eq!(splits.overall.matches_played(), 4);
    assert_eq!(splits.home.matches_played(), 3);
    assert_eq!(splits.away.matches_played(), 1);
    assert_eq!(splits.home.counts.goals_scored, 6);
    assert_eq!(splits.for_venue(Venue::Away).match_ids, vec![202]);
    assert_eq!(splits.away.own_average(StatKind::Corners), Some(7.0));
}

#[test]
fn competition_scope() {
    let pool = season();
    let everything = matches_involving(1, select_complete(&pool));
    let cup = AggregateScope::all().with_competition("cup");
    let agg = aggregate(1, everything.iter().copied(), &cup).unwrap();
    assert_eq!(agg.match_ids, vec![900]);

    let league = aggregate_splits(1, everything.iter().copied(), Some("9001")).unwrap();
    assert_eq!(league.overall.matches_played(), 4);
}
