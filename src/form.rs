use serde::Serialize;

use crate::error::StatsError;
use crate::normalize::{MatchResult, Orientation, team_view};
use crate::records::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    pub team_id: u32,
    /// Oldest first.
    pub results: Vec<MatchResult>,
    pub ppg_last3: Option<f64>,
    pub ppg_last5: Option<f64>,
    pub ppg_last10: Option<f64>,
    pub momentum: Option<u8>,
    pub trend: Option<Trend>,
    pub home_form: Vec<MatchResult>,
    pub away_form: Vec<MatchResult>,
}

impl FormSummary {
    pub fn form_string(&self) -> String {
        form_string(&self.results)
    }
}

/// Sorts by gameweek, then kickoff, then id. Matches without a gameweek go last.
pub fn chronological<'a, I>(matches: I) -> Vec<&'a MatchRecord>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut out: Vec<&MatchRecord> = matches.into_iter().collect();
    out.sort_by_key(|m| (m.game_week.unwrap_or(u32::MAX), m.date_unix.unwrap_or(0), m.id));
    out
}

/// Results of the team's last `n` scored matches, oldest first.
pub fn recent_form<'a, I>(team_id: u32, matches: I, n: usize) -> Result<Vec<MatchResult>, StatsError>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut results = results_in_order(team_id, matches, None)?;
    let skip = results.len().saturating_sub(n);
    Ok(results.split_off(skip))
}

pub fn form_summary<'a, I>(team_id: u32, matches: I) -> Result<FormSummary, StatsError>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let ordered = chronological(matches);
    let all = results_in_order(team_id, ordered.iter().copied(), None)?;
    let home = results_in_order(team_id, ordered.iter().copied(), Some(Orientation::Home))?;
    let away = results_in_order(team_id, ordered.iter().copied(), Some(Orientation::Away))?;

    let ppg_last3 = ppg(last_n(&all, 3));
    let ppg_last5 = ppg(last_n(&all, 5));
    let ppg_last10 = ppg(last_n(&all, 10));
    let momentum = ppg_last5.map(|p| (p * 40.0).floor().min(100.0) as u8);
    let trend = trend_of(&all);

    Ok(FormSummary {
        team_id,
        results: last_n(&all, 10).to_vec(),
        ppg_last3,
        ppg_last5,
        ppg_last10,
        momentum,
        trend,
        home_form: last_n(&home, 5).to_vec(),
        away_form: last_n(&away, 5).to_vec(),
    })
}

pub fn form_string(results: &[MatchResult]) -> String {
    results
        .iter()
        .map(|r| r.letter().to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// Most recent complete meeting between the two teams, at either venue.
pub fn last_meeting<'a, I>(team_id: u32, opponent_id: u32, matches: I) -> Option<&'a MatchRecord>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let meetings = matches
        .into_iter()
        .filter(|m| m.is_complete() && m.involves(team_id) && m.involves(opponent_id));
    chronological(meetings).pop()
}

fn results_in_order<'a, I>(
    team_id: u32,
    matches: I,
    venue: Option<Orientation>,
) -> Result<Vec<MatchResult>, StatsError>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut out = Vec::new();
    for record in chronological(matches) {
        if !record.is_complete() {
            continue;
        }
        let view = team_view(record, team_id)?;
        if venue.is_some_and(|v| v != view.orientation) {
            continue;
        }
        if let Some(result) = view.result() {
            out.push(result);
        }
    }
    Ok(out)
}

/// Points over the last 3 results against the 3 before them. Needs 6 results.
fn trend_of(results: &[MatchResult]) -> Option<Trend> {
    if results.len() < 6 {
        return None;
    }
    let recent = last_n(results, 6);
    let points = |rs: &[MatchResult]| rs.iter().map(|r| r.points()).sum::<u32>();
    let (previous, last) = recent.split_at(3);
    Some(match points(last).cmp(&points(previous)) {
        std::cmp::Ordering::Greater => Trend::Rising,
        std::cmp::Ordering::Less => Trend::Falling,
        std::cmp::Ordering::Equal => Trend::Steady,
    })
}

fn last_n(results: &[MatchResult], n: usize) -> &[MatchResult] {
    &results[results.len().saturating_sub(n)..]
}

fn ppg(results: &[MatchResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let points: u32 = results.iter().map(|r| r.points()).sum();
    Some(crate::aggregate::round2(
        f64::from(points) / results.len() as f64,
    ))
}
