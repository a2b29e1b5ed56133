//! Team aggregates.
//!
//! Every match is projected through [`team_view`] first, so the fold only
//! ever sees team-relative figures. Scope filters run before the fold and
//! ratios divide by the number of matches that were actually folded.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::StatsError;
use crate::normalize::{MatchResult, Orientation, TeamView, team_view};
use crate::records::{DataQuality, MatchRecord, StatKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    #[default]
    All,
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AggregateScope {
    pub venue: Venue,
    pub competition: Option<String>,
}

impl AggregateScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn venue(venue: Venue) -> Self {
        Self {
            venue,
            competition: None,
        }
    }

    pub fn with_competition(mut self, competition: impl Into<String>) -> Self {
        self.competition = Some(competition.into());
        self
    }

    pub fn admits(&self, view: &TeamView<'_>) -> bool {
        let venue_ok = match self.venue {
            Venue::All => true,
            Venue::Home => view.orientation == Orientation::Home,
            Venue::Away => view.orientation == Orientation::Away,
        };
        let competition_ok = match &self.competition {
            None => true,
            Some(key) => view.record.competition.as_deref() == Some(key.as_str()),
        };
        venue_ok && competition_ok
    }
}

/// Running summary for one statistic. `average` divides by `observed`, the
/// number of folded matches where the statistic was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StatSummary {
    pub observed: usize,
    pub total: f64,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl StatSummary {
    fn push(&mut self, value: f64) {
        self.observed += 1;
        self.total += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn finish(&mut self) {
        self.total = round2(self.total);
        self.average = (self.observed > 0).then(|| round2(self.total / self.observed as f64));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TeamCounts {
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub points: u32,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub clean_sheets: u32,
    pub failed_to_score: u32,
    pub btts: u32,
    pub over_05: u32,
    pub over_15: u32,
    pub over_25: u32,
}

impl TeamCounts {
    fn update(&mut self, result: MatchResult, goals_for: u32, goals_against: u32) {
        self.played += 1;
        self.points += result.points();
        match result {
            MatchResult::Win => self.won += 1,
            MatchResult::Draw => self.drawn += 1,
            MatchResult::Loss => self.lost += 1,
        }
        self.goals_scored += goals_for;
        self.goals_conceded += goals_against;
        if goals_against == 0 {
            self.clean_sheets += 1;
        }
        if goals_for == 0 {
            self.failed_to_score += 1;
        }
        if goals_for > 0 && goals_against > 0 {
            self.btts += 1;
        }
        let total = goals_for + goals_against;
        if total >= 1 {
            self.over_05 += 1;
        }
        if total >= 2 {
            self.over_15 += 1;
        }
        if total >= 3 {
            self.over_25 += 1;
        }
    }

    fn rates(&self) -> Option<TeamRates> {
        if self.played == 0 {
            return None;
        }
        let n = f64::from(self.played);
        let pct = |count: u32| round2(f64::from(count) * 100.0 / n);
        Some(TeamRates {
            points_per_game: round2(f64::from(self.points) / n),
            goals_per_match: round2(f64::from(self.goals_scored) / n),
            conceded_per_match: round2(f64::from(self.goals_conceded) / n),
            win_pct: pct(self.won),
            draw_pct: pct(self.drawn),
            loss_pct: pct(self.lost),
            clean_sheet_pct: pct(self.clean_sheets),
            failed_to_score_pct: pct(self.failed_to_score),
            btts_pct: pct(self.btts),
            over_05_pct: pct(self.over_05),
            over_15_pct: pct(self.over_15),
            over_25_pct: pct(self.over_25),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamRates {
    pub points_per_game: f64,
    pub goals_per_match: f64,
    pub conceded_per_match: f64,
    pub win_pct: f64,
    pub draw_pct: f64,
    pub loss_pct: f64,
    pub clean_sheet_pct: f64,
    pub failed_to_score_pct: f64,
    pub btts_pct: f64,
    pub over_05_pct: f64,
    pub over_15_pct: f64,
    pub over_25_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchQuality {
    pub match_id: u64,
    pub quality: DataQuality,
}

/// Immutable result of one fold. `rates` is `None` exactly when nothing was
/// folded, which keeps "no matches" apart from "zero events in N matches".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAggregate {
    pub team_id: u32,
    pub team_name: Option<String>,
    pub scope: AggregateScope,
    pub counts: TeamCounts,
    pub rates: Option<TeamRates>,
    pub own: BTreeMap<StatKind, StatSummary>,
    pub opponent: BTreeMap<StatKind, StatSummary>,
    pub match_totals: BTreeMap<StatKind, StatSummary>,
    pub match_ids: Vec<u64>,
    pub skipped_unscored: Vec<u64>,
    pub quality: Vec<MatchQuality>,
}

impl TeamAggregate {
    pub fn empty(team_id: u32, scope: AggregateScope) -> Self {
        Self {
            team_id,
            team_name: None,
            scope,
            counts: TeamCounts::default(),
            rates: None,
            own: BTreeMap::new(),
            opponent: BTreeMap::new(),
            match_totals: BTreeMap::new(),
            match_ids: Vec::new(),
            skipped_unscored: Vec::new(),
            quality: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.played == 0
    }

    pub fn matches_played(&self) -> u32 {
        self.counts.played
    }

    pub fn own_average(&self, kind: StatKind) -> Option<f64> {
        self.own.get(&kind).and_then(|s| s.average)
    }

    pub fn opponent_average(&self, kind: StatKind) -> Option<f64> {
        self.opponent.get(&kind).and_then(|s| s.average)
    }

    pub fn match_total_average(&self, kind: StatKind) -> Option<f64> {
        self.match_totals.get(&kind).and_then(|s| s.average)
    }
}

/// Overall, home-only and away-only aggregates over one match set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSplits {
    pub overall: TeamAggregate,
    pub home: TeamAggregate,
    pub away: TeamAggregate,
}

impl TeamSplits {
    pub fn for_venue(&self, venue: Venue) -> &TeamAggregate {
        match venue {
            Venue::All => &self.overall,
            Venue::Home => &self.home,
            Venue::Away => &self.away,
        }
    }
}

/// Folds `matches` into an aggregate for `team_id`.
///
/// Every match must involve the team; the caller narrows the pool first
/// (see [`crate::filter::matches_involving`]). Matches without a final score
/// are listed in `skipped_unscored` and contribute nothing. No data-quality
/// floor is applied here.
pub fn aggregate<'a, I>(
    team_id: u32,
    matches: I,
    scope: &AggregateScope,
) -> Result<TeamAggregate, StatsError>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut out = TeamAggregate::empty(team_id, scope.clone());

    for record in matches {
        let view = team_view(record, team_id)?;
        if out.team_name.is_none() {
            out.team_name = record.team_name(team_id).map(str::to_string);
        }
        if !scope.admits(&view) {
            continue;
        }
        let (Some(result), Some(gf), Some(ga)) =
            (view.result(), view.goals_for(), view.goals_against())
        else {
            out.skipped_unscored.push(record.id);
            continue;
        };

        out.counts.update(result, gf, ga);
        out.match_ids.push(record.id);
        out.quality.push(MatchQuality {
            match_id: record.id,
            quality: record.quality,
        });

        for kind in StatKind::ALL {
            if let Some(v) = view.own_stat(kind) {
                out.own.entry(kind).or_default().push(v);
            }
            if let Some(v) = view.opponent_stat(kind) {
                out.opponent.entry(kind).or_default().push(v);
            }
            if let Some(v) = record.match_total(kind) {
                out.match_totals.entry(kind).or_default().push(v);
            }
        }
    }

    for summary in out
        .own
        .values_mut()
        .chain(out.opponent.values_mut())
        .chain(out.match_totals.values_mut())
    {
        summary.finish();
    }
    out.rates = out.counts.rates();

    debug!(
        team_id,
        venue = ?scope.venue,
        played = out.counts.played,
        skipped = out.skipped_unscored.len(),
        "aggregated team"
    );
    Ok(out)
}

pub fn aggregate_splits<'a, I>(
    team_id: u32,
    matches: I,
    competition: Option<&str>,
) -> Result<TeamSplits, StatsError>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let pool: Vec<&MatchRecord> = matches.into_iter().collect();
    let scope_for = |venue| {
        let scope = AggregateScope::venue(venue);
        match competition {
            Some(key) => scope.with_competition(key),
            None => scope,
        }
    };
    Ok(TeamSplits {
        overall: aggregate(team_id, pool.iter().copied(), &scope_for(Venue::All))?,
        home: aggregate(team_id, pool.iter().copied(), &scope_for(Venue::Home))?,
        away: aggregate(team_id, pool.iter().copied(), &scope_for(Venue::Away))?,
    })
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Percentage of `part` over `whole`, 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    round2(part * 100.0 / whole)
}
