//! Gameweek backtesting.
//!
//! A run moves through `Configured -> Filtered -> Aggregated -> Predicted`
//! and ends in a [`BacktestResult`]. Each stage consumes the previous one,
//! so held-out records cannot reach aggregation or the predictor.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{AggregateScope, aggregate_splits};
use crate::error::StatsError;
use crate::filter::{Cutoff, matches_at, matches_involving, select_complete, select_eligible};
use crate::player::{aggregate_team_players, appearance};
use crate::predict::{Fixture, Market, Prediction, PredictionInput, Predictor, Selection};
use crate::records::{GoalKind, MatchRecord, PositionGroup, StatKind};

pub struct Configured<'a> {
    pool: &'a [MatchRecord],
    cutoff: u32,
    team_ids: Vec<u32>,
    positions: BTreeMap<u32, PositionGroup>,
}

impl<'a> Configured<'a> {
    /// An empty `team_ids` means every team scheduled at the cutoff.
    pub fn new(pool: &'a [MatchRecord], cutoff: u32, team_ids: &[u32]) -> Self {
        Self {
            pool,
            cutoff,
            team_ids: team_ids.to_vec(),
            positions: BTreeMap::new(),
        }
    }

    /// Static player positions used by player-prop predictors.
    pub fn with_positions(mut self, positions: BTreeMap<u32, PositionGroup>) -> Self {
        self.positions = positions;
        self
    }

    pub fn filter(self) -> Filtered<'a> {
        let partition = select_eligible(self.pool, Cutoff::Gameweek(self.cutoff));
        let training = select_complete(partition.eligible);
        let scheduled = matches_at(self.pool, self.cutoff);
        let held_out = select_complete(scheduled.iter().copied());

        let scope: HashSet<u32> = self.team_ids.iter().copied().collect();
        let schedule: Vec<Fixture> = scheduled
            .iter()
            .filter(|m| scope.is_empty() || scope.contains(&m.home_id) || scope.contains(&m.away_id))
            .map(|m| Fixture::from_record(m))
            .collect();
        let teams: BTreeSet<u32> = schedule
            .iter()
            .flat_map(|f| [f.home_id, f.away_id])
            .collect();

        info!(
            cutoff = self.cutoff,
            training = training.len(),
            held_out = held_out.len(),
            fixtures = schedule.len(),
            missing_ordinal = partition.missing_ordinal.len(),
            "filtered"
        );
        Filtered {
            cutoff: self.cutoff,
            team_ids: self.team_ids,
            positions: self.positions,
            training,
            held_out,
            schedule,
            teams,
        }
    }
}

pub struct Filtered<'a> {
    cutoff: u32,
    team_ids: Vec<u32>,
    positions: BTreeMap<u32, PositionGroup>,
    training: Vec<&'a MatchRecord>,
    held_out: Vec<&'a MatchRecord>,
    schedule: Vec<Fixture>,
    teams: BTreeSet<u32>,
}

impl<'a> Filtered<'a> {
    pub fn training(&self) -> &[&'a MatchRecord] {
        &self.training
    }

    /// Builds aggregates from the training set only.
    pub fn aggregate(self) -> Result<Aggregated<'a>, StatsError> {
        let mut teams = BTreeMap::new();
        let mut players = BTreeMap::new();
        for team_id in &self.teams {
            let own = matches_involving(*team_id, self.training.iter().copied());
            teams.insert(*team_id, aggregate_splits(*team_id, own.iter().copied(), None)?);
            players.insert(
                *team_id,
                aggregate_team_players(*team_id, own.iter().copied(), &AggregateScope::all())?,
            );
        }
        info!(cutoff = self.cutoff, teams = teams.len(), "aggregated");
        Ok(Aggregated {
            cutoff: self.cutoff,
            team_ids: self.team_ids,
            training_matches: self.training.len(),
            held_out: self.held_out,
            input: PredictionInput {
                cutoff: Cutoff::Gameweek(self.cutoff),
                fixtures: self.schedule,
                teams,
                players,
                positions: self.positions,
            },
        })
    }
}

pub struct Aggregated<'a> {
    cutoff: u32,
    team_ids: Vec<u32>,
    training_matches: usize,
    held_out: Vec<&'a MatchRecord>,
    input: PredictionInput,
}

impl<'a> Aggregated<'a> {
    pub fn input(&self) -> &PredictionInput {
        &self.input
    }

    pub fn predict<P>(self, predictor: &P) -> Predicted<'a>
    where
        P: Predictor + ?Sized,
    {
        let predictions = predictor.predict(&self.input);
        info!(predictions = predictions.len(), "predicted");
        Predicted {
            cutoff: self.cutoff,
            team_ids: self.team_ids,
            training_matches: self.training_matches,
            held_out: self.held_out,
            input: self.input,
            predictions,
        }
    }
}

pub struct Predicted<'a> {
    cutoff: u32,
    team_ids: Vec<u32>,
    training_matches: usize,
    held_out: Vec<&'a MatchRecord>,
    input: PredictionInput,
    predictions: Vec<Prediction>,
}

impl Predicted<'_> {
    pub fn evaluate(self) -> BacktestResult {
        let cutoff = self.cutoff;
        let mut result = BacktestResult {
            cutoff,
            team_ids: self.team_ids,
            status: EvaluationStatus::NoEvaluationData,
            training_matches: self.training_matches,
            held_out_matches: self.held_out.len(),
            fixtures: self.input.fixtures,
            predictions: self.predictions,
            evaluations: Vec::new(),
            tally: Tally::default(),
            by_market: BTreeMap::new(),
        };
        let actuals: BTreeMap<u64, MatchActuals> = self
            .held_out
            .iter()
            .map(|m| (m.id, MatchActuals::from_record(m)))
            .collect();
        for prediction in &result.predictions {
            let (actual, verdict) = match actuals.get(&prediction.match_id) {
                Some(a) => a.judge(prediction),
                None => (None, Verdict::Unresolved(UnresolvedReason::NoHeldOutRecord)),
            };
            result.tally.record(&verdict);
            result
                .by_market
                .entry(prediction.market.label().to_string())
                .or_default()
                .record(&verdict);
            result.evaluations.push(EvaluatedPrediction {
                prediction: *prediction,
                actual,
                verdict,
            });
        }
        if self.held_out.is_empty() {
            info!(cutoff, "no held-out matches to evaluate");
        } else {
            result.status = EvaluationStatus::Evaluated;
        }
        info!(
            cutoff,
            correct = result.tally.correct,
            incorrect = result.tally.incorrect,
            unresolved = result.tally.unresolved,
            "evaluated"
        );
        result
    }
}

/// Runs the whole pipeline for one target gameweek.
pub fn run_backtest<P>(
    pool: &[MatchRecord],
    cutoff: u32,
    team_ids: &[u32],
    predictor: &P,
) -> Result<BacktestResult, StatsError>
where
    P: Predictor + ?Sized,
{
    Ok(Configured::new(pool, cutoff, team_ids)
        .filter()
        .aggregate()?
        .predict(predictor)
        .evaluate())
}

/// Independent runs for several cutoffs, summed.
pub fn run_backtest_range<P>(
    pool: &[MatchRecord],
    cutoffs: &[u32],
    team_ids: &[u32],
    predictor: &P,
) -> Result<BacktestSummary, StatsError>
where
    P: Predictor + ?Sized,
{
    let runs = cutoffs
        .iter()
        .map(|cutoff| run_backtest(pool, *cutoff, team_ids, predictor))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BacktestSummary::from_runs(runs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Evaluated,
    NoEvaluationData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    NoHeldOutRecord,
    StatisticNotRecorded,
    PlayerDetailMissing,
    PlayerDidNotAppear,
    SelectionNotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict", content = "reason")]
pub enum Verdict {
    Correct,
    Incorrect,
    Unresolved(UnresolvedReason),
}

impl Verdict {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Verdict::Unresolved(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Correct => write!(f, "CORRECT"),
            Verdict::Incorrect => write!(f, "INCORRECT"),
            Verdict::Unresolved(_) => write!(f, "UNRESOLVED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluatedPrediction {
    pub prediction: Prediction,
    pub actual: Option<f64>,
    pub verdict: Verdict,
}

/// Correct/incorrect counts; unresolved entries are counted but never scored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Tally {
    pub correct: u32,
    pub incorrect: u32,
    pub unresolved: u32,
    pub accuracy: Option<f64>,
}

impl Tally {
    pub fn record(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Correct => self.correct += 1,
            Verdict::Incorrect => self.incorrect += 1,
            Verdict::Unresolved(_) => self.unresolved += 1,
        }
        self.refresh();
    }

    pub fn merge(&mut self, other: &Tally) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.unresolved += other.unresolved;
        self.refresh();
    }

    pub fn scored(&self) -> u32 {
        self.correct + self.incorrect
    }

    fn refresh(&mut self) {
        let scored = self.scored();
        self.accuracy = (scored > 0).then(|| {
            crate::aggregate::round2(f64::from(self.correct) * 100.0 / f64::from(scored))
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub cutoff: u32,
    pub team_ids: Vec<u32>,
    pub status: EvaluationStatus,
    pub training_matches: usize,
    pub held_out_matches: usize,
    pub fixtures: Vec<Fixture>,
    pub predictions: Vec<Prediction>,
    pub evaluations: Vec<EvaluatedPrediction>,
    pub tally: Tally,
    pub by_market: BTreeMap<String, Tally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub runs: Vec<BacktestResult>,
    pub tally: Tally,
    pub by_market: BTreeMap<String, Tally>,
}

impl BacktestSummary {
    pub fn from_runs(mut runs: Vec<BacktestResult>) -> Self {
        runs.sort_by_key(|r| r.cutoff);
        let mut tally = Tally::default();
        let mut by_market: BTreeMap<String, Tally> = BTreeMap::new();
        for run in &runs {
            tally.merge(&run.tally);
            for (label, t) in &run.by_market {
                by_market.entry(label.clone()).or_default().merge(t);
            }
        }
        Self {
            runs,
            tally,
            by_market,
        }
    }
}

/// Outcome fields of one held-out match.
#[derive(Debug, Clone, Default)]
struct MatchActuals {
    total_goals: Option<f64>,
    total_corners: Option<f64>,
    total_cards: Option<f64>,
    btts: Option<bool>,
    has_player_detail: bool,
    appeared: HashSet<u32>,
    scorers: HashSet<u32>,
    booked: HashSet<u32>,
}

impl MatchActuals {
    fn from_record(m: &MatchRecord) -> Self {
        let score = m.score();
        let mut out = MatchActuals {
            total_goals: score.map(|(h, a)| f64::from(h + a)),
            total_corners: m.match_total(StatKind::Corners),
            total_cards: m.match_total(StatKind::Cards),
            btts: score.map(|(h, a)| h > 0 && a > 0),
            has_player_detail: m.team_a.has_details() && m.team_b.has_details(),
            ..MatchActuals::default()
        };
        for side in [&m.team_a, &m.team_b] {
            let candidates = side
                .lineup
                .iter()
                .map(|p| p.player_id)
                .chain(side.bench.iter().map(|s| s.player_in));
            for player_id in candidates {
                if appearance(side, player_id).is_some() {
                    out.appeared.insert(player_id);
                }
            }
            out.scorers.extend(
                side.goals
                    .iter()
                    .filter(|g| g.kind != GoalKind::OwnGoal)
                    .map(|g| g.player_id),
            );
            out.booked.extend(side.cards.iter().map(|c| c.player_id));
        }
        debug!(match_id = m.id, appeared = out.appeared.len(), "extracted actuals");
        out
    }

    fn judge(&self, prediction: &Prediction) -> (Option<f64>, Verdict) {
        use UnresolvedReason::*;
        let line_verdict = |actual: Option<f64>| -> (Option<f64>, Verdict) {
            let Some(value) = actual else {
                return (None, Verdict::Unresolved(StatisticNotRecorded));
            };
            let hit = match prediction.selection {
                Selection::Over(line) => value > line,
                Selection::Under(line) => value < line,
                Selection::Yes | Selection::No => {
                    return (Some(value), Verdict::Unresolved(SelectionNotApplicable));
                }
            };
            (Some(value), verdict_of(hit))
        };
        let player_verdict = |player_id: u32, happened: &HashSet<u32>| -> (Option<f64>, Verdict) {
            if !self.has_player_detail {
                return (None, Verdict::Unresolved(PlayerDetailMissing));
            }
            if !self.appeared.contains(&player_id) {
                return (None, Verdict::Unresolved(PlayerDidNotAppear));
            }
            let occurred = happened.contains(&player_id);
            let actual = Some(if occurred { 1.0 } else { 0.0 });
            match prediction.selection {
                Selection::Yes => (actual, verdict_of(occurred)),
                Selection::No => (actual, verdict_of(!occurred)),
                _ => (actual, Verdict::Unresolved(SelectionNotApplicable)),
            }
        };

        match prediction.market {
            Market::TotalGoals => line_verdict(self.total_goals),
            Market::TotalCorners => line_verdict(self.total_corners),
            Market::TotalCards => line_verdict(self.total_cards),
            Market::BothTeamsToScore => {
                let Some(btts) = self.btts else {
                    return (None, Verdict::Unresolved(StatisticNotRecorded));
                };
                let actual = Some(if btts { 1.0 } else { 0.0 });
                match prediction.selection {
                    Selection::Yes => (actual, verdict_of(btts)),
                    Selection::No => (actual, verdict_of(!btts)),
                    _ => (actual, Verdict::Unresolved(SelectionNotApplicable)),
                }
            }
            Market::PlayerToScore { player_id } => player_verdict(player_id, &self.scorers),
            Market::PlayerToBeBooked { player_id } => player_verdict(player_id, &self.booked),
        }
    }
}

fn verdict_of(hit: bool) -> Verdict {
    if hit {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}
