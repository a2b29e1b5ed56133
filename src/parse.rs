use std::collections::HashSet;

use serde_json::Value;

use crate::error::{StatsError, StatsResult};
use crate::records::{
    CardDetail, CardKind, DataQuality, GoalDetail, GoalKind, H2hSummary, LeagueTableRow,
    LineupEntry, MatchRecord, MatchStatus, PlayerEvent, PlayerRecord, QualityFamily, QualityLevel,
    SideRecord, Substitution, TeamStats,
};

/// Parses a JSON document holding match records: either a bare array or an
/// object with a `data` array.
pub fn parse_match_records_json(raw: &str) -> StatsResult<Vec<MatchRecord>> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|err| StatsError::malformed(None, format!("invalid json: {err}")))?;
    if root.is_null() {
        return Ok(Vec::new());
    }
    let items = list_payload(&root)
        .ok_or_else(|| StatsError::malformed(None, "expected an array of matches"))?;
    items.iter().map(parse_match_record).collect()
}

pub fn parse_match_record(v: &Value) -> StatsResult<MatchRecord> {
    let id = v
        .get("id")
        .and_then(as_u64_any)
        .ok_or_else(|| StatsError::malformed(None, "missing id"))?;
    let home_id = v
        .get("homeID")
        .and_then(as_u32_any)
        .ok_or_else(|| StatsError::malformed(Some(id), "missing homeID"))?;
    let away_id = v
        .get("awayID")
        .and_then(as_u32_any)
        .ok_or_else(|| StatsError::malformed(Some(id), "missing awayID"))?;
    if home_id == away_id {
        return Err(StatsError::malformed(
            Some(id),
            format!("home and away ids are both {home_id}"),
        ));
    }

    let raw_status = v
        .get("status")
        .and_then(|x| x.as_str())
        .ok_or_else(|| StatsError::malformed(Some(id), "missing status"))?;
    let status = MatchStatus::from_provider(raw_status).ok_or_else(|| {
        StatsError::malformed(Some(id), format!("unknown status {raw_status:?}"))
    })?;

    // Knockout ties carry game_week 0; treat them like a missing ordinal.
    let game_week = v
        .get("game_week")
        .and_then(as_u32_any)
        .filter(|gw| *gw > 0);
    let date_unix = v
        .get("date_unix")
        .and_then(as_i64_any)
        .filter(|ts| *ts > 0);
    let competition = v.get("competition_id").and_then(|x| match x {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let mut team_a = parse_side(v, "team_a", "homeGoalCount");
    let mut team_b = parse_side(v, "team_b", "awayGoalCount");
    if let Some(lineups) = v.get("lineups") {
        team_a.lineup = parse_lineup(lineups.get("team_a"));
        team_b.lineup = parse_lineup(lineups.get("team_b"));
    }
    if let Some(bench) = v.get("bench") {
        team_a.bench = parse_bench(bench.get("team_a"));
        team_b.bench = parse_bench(bench.get("team_b"));
    }

    let total_goals = stat_u32(v, "totalGoalCount");
    if let (Some(h), Some(a), Some(total)) = (team_a.stats.goals, team_b.stats.goals, total_goals)
        && h.checked_add(a) != Some(total)
    {
        return Err(StatsError::malformed(
            Some(id),
            format!("goal counts {h}+{a} do not match total {total}"),
        ));
    }
    if status == MatchStatus::Complete && (team_a.stats.goals.is_none() || team_b.stats.goals.is_none())
    {
        return Err(StatsError::MissingScore { match_id: id });
    }

    let mut quality = DataQuality::default();
    for family in QualityFamily::ALL {
        let level = v
            .get(family.provider_key())
            .and_then(as_i64_any)
            .map(QualityLevel::from_code)
            .unwrap_or_default();
        quality.set(family, level);
    }

    Ok(MatchRecord {
        id,
        home_id,
        away_id,
        home_name: str_field(v, "home_name").unwrap_or_default(),
        away_name: str_field(v, "away_name").unwrap_or_default(),
        game_week,
        status,
        date_unix,
        competition,
        total_goals,
        quality,
        team_a,
        team_b,
        h2h: v.get("h2h").and_then(parse_h2h),
    })
}

fn parse_side(v: &Value, prefix: &str, goals_key: &str) -> SideRecord {
    let key = |suffix: &str| format!("{prefix}_{suffix}");
    let stats = TeamStats {
        goals: stat_u32(v, goals_key),
        ht_goals: stat_u32(v, &format!("ht_goals_{prefix}")),
        corners: stat_u32(v, &key("corners")),
        fh_corners: stat_u32(v, &key("fh_corners")),
        sh_corners: stat_u32(v, &key("2h_corners")),
        shots: stat_u32(v, &key("shots")),
        shots_on_target: stat_u32(v, &key("shotsOnTarget")),
        shots_off_target: stat_u32(v, &key("shotsOffTarget")),
        cards: stat_u32(v, &key("cards_num")),
        yellow_cards: stat_u32(v, &key("yellow_cards")),
        red_cards: stat_u32(v, &key("red_cards")),
        possession: stat_u32(v, &key("possession")),
        fouls: stat_u32(v, &key("fouls")),
        offsides: stat_u32(v, &key("offsides")),
        attacks: stat_u32(v, &key("attacks")),
        dangerous_attacks: stat_u32(v, &key("dangerous_attacks")),
        xg: v
            .get(key("xg"))
            .and_then(as_f64_any)
            .filter(|x| *x >= 0.0),
        throwins: stat_u32(v, &key("throwins")),
        freekicks: stat_u32(v, &key("freekicks")),
        goalkicks: stat_u32(v, &key("goalkicks")),
        penalty_goals: stat_u32(v, &key("penalty_goals")),
    };

    let goals = v
        .get(key("goal_details"))
        .and_then(|x| x.as_array())
        .map(|items| items.iter().filter_map(parse_goal_detail).collect())
        .unwrap_or_default();
    let cards = v
        .get(key("card_details"))
        .and_then(|x| x.as_array())
        .map(|items| items.iter().filter_map(parse_card_detail).collect())
        .unwrap_or_default();

    SideRecord {
        stats,
        lineup: Vec::new(),
        bench: Vec::new(),
        goals,
        cards,
    }
}

fn parse_goal_detail(v: &Value) -> Option<GoalDetail> {
    let player_id = v.get("player_id").and_then(as_u32_any)?;
    Some(GoalDetail {
        player_id,
        // -1 marks an unassisted goal.
        assist_player_id: v
            .get("assist_player_id")
            .and_then(as_i64_any)
            .and_then(|x| u32::try_from(x).ok())
            .filter(|x| *x > 0),
        minute: v.get("time").and_then(parse_minute),
        kind: v
            .get("type")
            .and_then(|x| x.as_str())
            .map(GoalKind::from_provider)
            .unwrap_or(GoalKind::Regular),
    })
}

fn parse_card_detail(v: &Value) -> Option<CardDetail> {
    let player_id = v.get("player_id").and_then(as_u32_any)?;
    let kind = v
        .get("card_type")
        .and_then(|x| x.as_str())
        .and_then(CardKind::from_provider)?;
    Some(CardDetail {
        player_id,
        kind,
        minute: v.get("time").and_then(parse_minute),
    })
}

fn parse_lineup(v: Option<&Value>) -> Vec<LineupEntry> {
    let Some(items) = v.and_then(|x| x.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let player_id = item.get("player_id").and_then(as_u32_any)?;
            let events = item
                .get("player_events")
                .and_then(|x| x.as_array())
                .map(|evs| {
                    evs.iter()
                        .filter_map(|ev| {
                            Some(PlayerEvent {
                                kind: ev.get("event_type")?.as_str()?.to_string(),
                                minute: ev.get("event_time").and_then(parse_minute),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(LineupEntry {
                player_id,
                shirt_number: item.get("shirt_number").and_then(as_u32_any),
                events,
            })
        })
        .collect()
}

fn parse_bench(v: Option<&Value>) -> Vec<Substitution> {
    let Some(items) = v.and_then(|x| x.as_array()) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            Some(Substitution {
                player_in: item.get("player_in_id").and_then(as_u32_any)?,
                player_out: item
                    .get("player_out_id")
                    .and_then(as_u32_any)
                    .filter(|x| *x > 0),
                minute: item.get("player_out_time").and_then(parse_minute),
            })
        })
        .collect()
}

fn parse_h2h(v: &Value) -> Option<H2hSummary> {
    let results = v.get("previous_matches_results")?;
    let betting = v.get("betting_stats");
    let pct = |key: &str| {
        betting
            .and_then(|b| b.get(key))
            .and_then(as_f64_any)
            .filter(|x| *x >= 0.0)
    };
    Some(H2hSummary {
        team_a_wins: results.get("team_a_wins").and_then(as_u32_any).unwrap_or(0),
        team_b_wins: results.get("team_b_wins").and_then(as_u32_any).unwrap_or(0),
        draws: results.get("draw").and_then(as_u32_any).unwrap_or(0),
        total_matches: results
            .get("totalMatches")
            .and_then(as_u32_any)
            .unwrap_or(0),
        btts_pct: pct("bttsPercentage"),
        over25_pct: pct("over25Percentage"),
        avg_goals: pct("avg_goals"),
    })
}

pub fn parse_players_json(raw: &str) -> StatsResult<Vec<PlayerRecord>> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|err| StatsError::malformed(None, format!("invalid json: {err}")))?;
    if root.is_null() {
        return Ok(Vec::new());
    }
    let items = list_payload(&root)
        .ok_or_else(|| StatsError::malformed(None, "expected an array of players"))?;
    items.iter().map(parse_player_record).collect()
}

pub fn parse_player_record(v: &Value) -> StatsResult<PlayerRecord> {
    let id = v
        .get("id")
        .and_then(as_u32_any)
        .ok_or_else(|| StatsError::malformed(None, "player without id"))?;
    let count = |key: &str| stat_u32(v, key).unwrap_or(0);
    let name = str_field(v, "known_as")
        .filter(|s| !s.is_empty())
        .or_else(|| str_field(v, "full_name"))
        .unwrap_or_else(|| "Unknown".to_string());
    Ok(PlayerRecord {
        id,
        name,
        position: str_field(v, "position"),
        club_team_id: v.get("club_team_id").and_then(as_u32_any),
        appearances: count("appearances_overall"),
        minutes: count("minutes_played_overall"),
        goals: count("goals_overall"),
        assists: count("assists_overall"),
        cards: count("cards_overall"),
        yellow_cards: count("yellow_cards_overall"),
        red_cards: count("red_cards_overall"),
    })
}

pub fn parse_league_table_json(raw: &str) -> StatsResult<Vec<LeagueTableRow>> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|err| StatsError::malformed(None, format!("invalid json: {err}")))?;
    Ok(parse_league_table(&root))
}

/// Reads the flat `league_table`, falling back to `specific_tables[].table`
/// and `specific_tables[].groups[].table`. Rows are deduplicated by team id.
pub fn parse_league_table(root: &Value) -> Vec<LeagueTableRow> {
    let data = root.get("data").unwrap_or(root);
    let mut raw_rows: Vec<&Value> = Vec::new();
    if let Some(rows) = data.get("league_table").and_then(|x| x.as_array())
        && !rows.is_empty()
    {
        raw_rows.extend(rows);
    } else if let Some(tables) = data.get("specific_tables").and_then(|x| x.as_array()) {
        for table in tables {
            if let Some(rows) = table.get("table").and_then(|x| x.as_array()) {
                raw_rows.extend(rows);
            }
            for group in table
                .get("groups")
                .and_then(|x| x.as_array())
                .into_iter()
                .flatten()
            {
                if let Some(rows) = group.get("table").and_then(|x| x.as_array()) {
                    raw_rows.extend(rows);
                }
            }
        }
    } else if let Some(rows) = data.as_array() {
        raw_rows.extend(rows);
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in raw_rows {
        let Some(team_id) = row.get("id").and_then(as_u32_any) else {
            continue;
        };
        if !seen.insert(team_id) {
            continue;
        }
        let goals_for = stat_u32(row, "seasonGoals").unwrap_or(0);
        let goals_against = stat_u32(row, "seasonConceded").unwrap_or(0);
        let goal_difference = row
            .get("seasonGoalDifference")
            .and_then(as_i32_any)
            .unwrap_or_else(|| {
                let diff = i64::from(goals_for) - i64::from(goals_against);
                diff.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
            });
        out.push(LeagueTableRow {
            team_id,
            name: str_field(row, "name")
                .or_else(|| str_field(row, "cleanName"))
                .unwrap_or_default(),
            position: row.get("position").and_then(as_u32_any),
            played: stat_u32(row, "matchesPlayed").unwrap_or(0),
            goals_for,
            goals_against,
            goal_difference,
            points: stat_u32(row, "points").unwrap_or(0),
        });
    }
    out
}

fn list_payload(root: &Value) -> Option<&Vec<Value>> {
    root.as_array()
        .or_else(|| root.get("data").and_then(|x| x.as_array()))
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(|s| s.trim().to_string())
}

/// Reads a count statistic; the provider writes -1 for "not recorded".
fn stat_u32(v: &Value, key: &str) -> Option<u32> {
    let n = v.get(key).and_then(as_i64_any)?;
    u32::try_from(n).ok()
}

/// Minutes arrive as numbers or strings like "45+2" or "90'".
fn parse_minute(v: &Value) -> Option<u32> {
    if let Some(n) = as_u32_any(v) {
        return Some(n);
    }
    let raw = v.as_str()?.trim();
    let digits: String = raw.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    digits.parse::<u32>().ok()
}

fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    let n = as_u64_any(v)?;
    u32::try_from(n).ok()
}

fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return Some(f.round() as i64);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

fn as_i32_any(v: &Value) -> Option<i32> {
    let n = as_i64_any(v)?;
    i32::try_from(n).ok()
}

fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_match_record, parse_minute};
    use crate::error::StatsError;

    #[test]
    fn parse_minute_handles_stoppage_time() {
        assert_eq!(parse_minute(&json!(45)), Some(45));
        assert_eq!(parse_minute(&json!("45+2")), Some(45));
        assert_eq!(parse_minute(&json!("90'")), Some(90));
        assert_eq!(parse_minute(&json!("?")), None);
    }

    #[test]
    fn rejects_same_team_on_both_sides() {
        let v = json!({"id": 1, "homeID": 5, "awayID": 5, "status": "complete",
            "homeGoalCount": 0, "awayGoalCount": 0});
        let err = parse_match_record(&v).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRecord { match_id: Some(1), .. }));
    }

    #[test]
    fn negative_stats_are_absent() {
        let v = json!({"id": 2, "homeID": 1, "awayID": 2, "status": "complete",
            "homeGoalCount": 1, "awayGoalCount": 0, "team_a_corners": -1, "team_b_corners": 4});
        let m = parse_match_record(&v).unwrap();
        assert_eq!(m.team_a.stats.corners, None);
        assert_eq!(m.team_b.stats.corners, Some(4));
    }
}
