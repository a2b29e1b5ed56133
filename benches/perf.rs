use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use std::hint::black_box;

use footy_stats::aggregate::{AggregateScope, aggregate};
use footy_stats::backtest::run_backtest;
use footy_stats::filter::{Cutoff, matches_involving, select_complete, select_eligible};
use footy_stats::parse::{parse_match_record, parse_match_records_json};
use footy_stats::predict::ThresholdPredictor;
use footy_stats::records::MatchRecord;

const TEAMS: u32 = 20;
const GAMEWEEKS: u32 = 38;

/// Every team plays once per gameweek; scorelines and counting stats are random.
fn synthetic_season(seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::new();
    for gw in 1..=GAMEWEEKS {
        for slot in 0..TEAMS / 2 {
            let home = (slot + gw) % TEAMS + 1;
            let away = (TEAMS - 1 - slot + gw) % TEAMS + 1;
            let hg: u32 = rng.gen_range(0..5);
            let ag: u32 = rng.gen_range(0..4);
            out.push(json!({
                "id": u64::from(gw) * 100 + u64::from(slot),
                "homeID": home,
                "awayID": away,
                "home_name": format!("Team {home}"),
                "away_name": format!("Team {away}"),
                "status": "complete",
                "game_week": gw,
                "date_unix": 1_723_800_000 + i64::from(gw) * 604_800,
                "homeGoalCount": hg,
                "awayGoalCount": ag,
                "totalGoalCount": hg + ag,
                "team_a_corners": rng.gen_range(1..12u32),
                "team_b_corners": rng.gen_range(1..10u32),
                "team_a_cards_num": rng.gen_range(0..5u32),
                "team_b_cards_num": rng.gen_range(0..5u32),
                "team_a_shots": rng.gen_range(4..25u32),
                "team_b_shots": rng.gen_range(3..20u32),
                "team_a_possession": 50,
                "team_b_possession": 50,
                "corner_timings_recorded": 2,
                "card_timings_recorded": 1,
            }));
        }
    }
    out
}

fn parsed_season() -> Vec<MatchRecord> {
    synthetic_season(7)
        .iter()
        .map(|v| parse_match_record(v).expect("synthetic record parses"))
        .collect()
}

fn bench_season_parse(c: &mut Criterion) {
    let raw = Value::Array(synthetic_season(7)).to_string();
    c.bench_function("season_parse", |b| {
        b.iter(|| {
            let rows = parse_match_records_json(black_box(&raw)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_fixture_parse(c: &mut Criterion) {
    c.bench_function("fixture_parse", |b| {
        b.iter(|| {
            let rows = parse_match_records_json(black_box(SEASON_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_temporal_filter(c: &mut Criterion) {
    let season = parsed_season();
    c.bench_function("temporal_filter", |b| {
        b.iter(|| {
            let part = select_eligible(black_box(&season), Cutoff::Gameweek(20));
            black_box(select_complete(part.eligible).len());
        })
    });
}

fn bench_team_aggregate(c: &mut Criterion) {
    let season = parsed_season();
    let history = matches_involving(1, select_complete(&season));
    c.bench_function("team_aggregate", |b| {
        b.iter(|| {
            let agg = aggregate(1, black_box(history.iter().copied()), &AggregateScope::all())
                .unwrap();
            black_box(agg.counts.played);
        })
    });
}

fn bench_backtest_gameweek(c: &mut Criterion) {
    let season = parsed_season();
    let predictor = ThresholdPredictor::default();
    c.bench_function("backtest_gameweek", |b| {
        b.iter(|| {
            let result = run_backtest(black_box(&season), 30, &[], &predictor).unwrap();
            black_box(result.tally.correct);
        })
    });
}

criterion_group!(
    perf,
    bench_season_parse,
    bench_fixture_parse,
    bench_temporal_filter,
    bench_team_aggregate,
    bench_backtest_gameweek
);
criterion_main!(perf);

static SEASON_JSON: &str = include_str!("../tests/fixtures/season_matches.json");
