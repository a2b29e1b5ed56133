use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::StatsError;
use crate::records::{MatchRecord, MatchStatus, QualityFamily, QualityLevel};

/// Exclusive upper bound for the historical window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    Gameweek(u32),
    Timestamp(DateTime<Utc>),
}

impl Cutoff {
    /// `Ok(true)` when the match happened strictly before the cutoff.
    pub fn admits(&self, m: &MatchRecord) -> Result<bool, StatsError> {
        match self {
            Cutoff::Gameweek(gw) => m
                .game_week
                .map(|week| week < *gw)
                .ok_or(StatsError::MissingTemporalOrdinal { match_id: m.id }),
            Cutoff::Timestamp(ts) => m
                .kickoff()
                .map(|kickoff| kickoff < *ts)
                .ok_or(StatsError::MissingTemporalOrdinal { match_id: m.id }),
        }
    }
}

impl std::fmt::Display for Cutoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cutoff::Gameweek(gw) => write!(f, "GW{gw}"),
            Cutoff::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M UTC")),
        }
    }
}

/// Total, disjoint split of the input. `missing_ordinal` lists the excluded
/// matches that lacked the field the cutoff compares against.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    pub eligible: Vec<&'a MatchRecord>,
    pub excluded: Vec<&'a MatchRecord>,
    pub missing_ordinal: Vec<u64>,
}

pub fn select_eligible<'a, I>(matches: I, cutoff: Cutoff) -> Partition<'a>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut out = Partition::default();
    for m in matches {
        match cutoff.admits(m) {
            Ok(true) => out.eligible.push(m),
            Ok(false) => out.excluded.push(m),
            Err(err) => {
                debug!(match_id = m.id, %err, "excluding match");
                out.missing_ordinal.push(m.id);
                out.excluded.push(m);
            }
        }
    }
    debug!(
        %cutoff,
        eligible = out.eligible.len(),
        excluded = out.excluded.len(),
        "temporal partition"
    );
    out
}

pub fn select_complete<'a, I>(matches: I) -> Vec<&'a MatchRecord>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    matches.into_iter().filter(|m| m.is_complete()).collect()
}

/// Matches scheduled in exactly `game_week`, whatever their status.
pub fn matches_at<'a, I>(matches: I, game_week: u32) -> Vec<&'a MatchRecord>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    matches
        .into_iter()
        .filter(|m| m.game_week == Some(game_week))
        .collect()
}

pub fn matches_involving<'a, I>(team_id: u32, matches: I) -> Vec<&'a MatchRecord>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    matches.into_iter().filter(|m| m.involves(team_id)).collect()
}

/// Keeps matches whose indicator for `family` is at least `floor`.
pub fn filter_by_quality<'a, I>(
    matches: I,
    family: QualityFamily,
    floor: QualityLevel,
) -> Vec<&'a MatchRecord>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    matches
        .into_iter()
        .filter(|m| m.quality.level(family) >= floor)
        .collect()
}

/// Earliest gameweek that still has an unplayed fixture, else the week after
/// the last completed one, else 1.
pub fn next_gameweek(matches: &[MatchRecord]) -> u32 {
    let pending = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Incomplete)
        .filter_map(|m| m.game_week)
        .min();
    if let Some(gw) = pending {
        return gw;
    }
    matches
        .iter()
        .filter(|m| m.is_complete())
        .filter_map(|m| m.game_week)
        .max()
        .map(|gw| gw + 1)
        .unwrap_or(1)
}

pub fn completed_gameweeks(matches: &[MatchRecord]) -> BTreeSet<u32> {
    matches
        .iter()
        .filter(|m| m.is_complete())
        .filter_map(|m| m.game_week)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DataQuality, SideRecord};

    fn fixture(id: u64, gw: Option<u32>, status: MatchStatus) -> MatchRecord {
        MatchRecord {
            id,
            home_id: 1,
            away_id: 2,
            home_name: "A".to_string(),
            away_name: "B".to_string(),
            game_week: gw,
            status,
            date_unix: None,
            competition: None,
            total_goals: None,
            quality: DataQuality::default(),
            team_a: SideRecord::default(),
            team_b: SideRecord::default(),
            h2h: None,
        }
    }

    #[test]
    fn next_gameweek_prefers_pending_fixtures() {
        let rows = vec![
            fixture(1, Some(1), MatchStatus::Complete),
            fixture(2, Some(2), MatchStatus::Complete),
            fixture(3, Some(4), MatchStatus::Incomplete),
            fixture(4, Some(3), MatchStatus::Incomplete),
        ];
        assert_eq!(next_gameweek(&rows), 3);
    }

    #[test]
    fn next_gameweek_falls_back() {
        let rows = vec![fixture(1, Some(7), MatchStatus::Complete)];
        assert_eq!(next_gameweek(&rows), 8);
        assert_eq!(next_gameweek(&[]), 1);
    }

    #[test]
    fn timestamp_cutoff_needs_kickoff() {
        let m = fixture(9, Some(3), MatchStatus::Complete);
        let cutoff = Cutoff::Timestamp(Utc::now());
        assert_eq!(
            cutoff.admits(&m),
            Err(StatsError::MissingTemporalOrdinal { match_id: 9 })
        );
    }
}
