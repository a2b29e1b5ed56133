use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::aggregate::{TeamAggregate, TeamSplits};
use crate::filter::Cutoff;
use crate::player::{DEFAULT_MIN_MINUTES, PlayerAggregate};
use crate::records::{MatchRecord, PositionGroup, StatKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Market {
    TotalGoals,
    TotalCorners,
    TotalCards,
    BothTeamsToScore,
    PlayerToScore { player_id: u32 },
    PlayerToBeBooked { player_id: u32 },
}

impl Market {
    /// Grouping key for per-market tallies; player markets share one label.
    pub fn label(&self) -> &'static str {
        match self {
            Market::TotalGoals => "Goals",
            Market::TotalCorners => "Corners",
            Market::TotalCards => "Cards",
            Market::BothTeamsToScore => "BTTS",
            Market::PlayerToScore { .. } => "Player goal",
            Market::PlayerToBeBooked { .. } => "Player card",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "side", content = "line")]
pub enum Selection {
    Over(f64),
    Under(f64),
    Yes,
    No,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Over(line) => write!(f, "Over {line}"),
            Selection::Under(line) => write!(f, "Under {line}"),
            Selection::Yes => write!(f, "Yes"),
            Selection::No => write!(f, "No"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub match_id: u64,
    pub market: Market,
    pub selection: Selection,
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    TooRisky,
    Risky,
    Safe,
    UltraSafe,
}

impl ConfidenceBand {
    pub fn of(confidence: u8) -> Self {
        match confidence {
            c if c >= 90 => ConfidenceBand::UltraSafe,
            c if c >= 75 => ConfidenceBand::Safe,
            c if c >= 60 => ConfidenceBand::Risky,
            _ => ConfidenceBand::TooRisky,
        }
    }
}

/// Identity of a fixture to predict. Carries no outcome fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fixture {
    pub match_id: u64,
    pub game_week: Option<u32>,
    pub home_id: u32,
    pub away_id: u32,
    pub home_name: String,
    pub away_name: String,
}

impl Fixture {
    pub fn from_record(m: &MatchRecord) -> Self {
        Self {
            match_id: m.id,
            game_week: m.game_week,
            home_id: m.home_id,
            away_id: m.away_id,
            home_name: m.home_name.clone(),
            away_name: m.away_name.clone(),
        }
    }
}

/// Everything a predictor may look at. Built only from pre-cutoff data.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionInput {
    pub cutoff: Cutoff,
    pub fixtures: Vec<Fixture>,
    pub teams: BTreeMap<u32, TeamSplits>,
    pub players: BTreeMap<u32, Vec<PlayerAggregate>>,
    pub positions: BTreeMap<u32, PositionGroup>,
}

pub trait Predictor {
    fn predict(&self, input: &PredictionInput) -> Vec<Prediction>;
}

impl<F> Predictor for F
where
    F: Fn(&PredictionInput) -> Vec<Prediction>,
{
    fn predict(&self, input: &PredictionInput) -> Vec<Prediction> {
        self(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Over,
    Under,
}

/// Fires when the expected total clears `line + buffer` in the rule's direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineRule {
    pub line: f64,
    pub confidence: u8,
    pub direction: Direction,
    pub buffer: f64,
}

impl LineRule {
    const fn new(line: f64, confidence: u8, direction: Direction, buffer: f64) -> Self {
        Self {
            line,
            confidence,
            direction,
            buffer,
        }
    }

    fn fires(&self, expected: f64) -> bool {
        match self.direction {
            Direction::Over => expected > self.line + self.buffer,
            Direction::Under => expected < self.line + self.buffer,
        }
    }

    fn selection(&self) -> Selection {
        match self.direction {
            Direction::Over => Selection::Over(self.line),
            Direction::Under => Selection::Under(self.line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    #[serde(default = "default_min_matches")]
    pub min_matches: u32,
    #[serde(default = "default_min_player_minutes")]
    pub min_player_minutes: u32,
    #[serde(default = "default_min_player_confidence")]
    pub min_player_confidence: u8,
    #[serde(default = "default_max_player_props")]
    pub max_player_props_per_team: usize,
    #[serde(default = "default_btts_yes_above")]
    pub btts_yes_above: f64,
    #[serde(default = "default_btts_no_below")]
    pub btts_no_below: f64,
    #[serde(default = "default_corner_rules")]
    pub corners: Vec<LineRule>,
    #[serde(default = "default_card_rules")]
    pub cards: Vec<LineRule>,
    #[serde(default = "default_goal_rules")]
    pub goals: Vec<LineRule>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_matches: default_min_matches(),
            min_player_minutes: default_min_player_minutes(),
            min_player_confidence: default_min_player_confidence(),
            max_player_props_per_team: default_max_player_props(),
            btts_yes_above: default_btts_yes_above(),
            btts_no_below: default_btts_no_below(),
            corners: default_corner_rules(),
            cards: default_card_rules(),
            goals: default_goal_rules(),
        }
    }
}

impl PredictorConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read predictor config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse predictor config {}", path.display()))
    }
}

fn default_min_matches() -> u32 {
    3
}

fn default_min_player_minutes() -> u32 {
    DEFAULT_MIN_MINUTES
}

fn default_min_player_confidence() -> u8 {
    60
}

fn default_max_player_props() -> usize {
    2
}

fn default_btts_yes_above() -> f64 {
    65.0
}

fn default_btts_no_below() -> f64 {
    35.0
}

fn default_corner_rules() -> Vec<LineRule> {
    use Direction::{Over, Under};
    vec![
        LineRule::new(5.5, 96, Over, 2.5),
        LineRule::new(6.5, 94, Over, 2.0),
        LineRule::new(7.5, 91, Over, 2.0),
        LineRule::new(8.5, 88, Over, 1.5),
        LineRule::new(9.5, 84, Over, 1.5),
        LineRule::new(10.5, 79, Over, 1.5),
        LineRule::new(11.5, 73, Over, 1.5),
        LineRule::new(13.5, 91, Under, -2.0),
        LineRule::new(12.5, 86, Under, -1.5),
        LineRule::new(11.5, 80, Under, -1.5),
    ]
}

fn default_card_rules() -> Vec<LineRule> {
    use Direction::{Over, Under};
    vec![
        LineRule::new(1.5, 96, Over, 1.0),
        LineRule::new(2.5, 92, Over, 0.8),
        LineRule::new(3.5, 87, Over, 0.7),
        LineRule::new(4.5, 79, Over, 0.7),
        LineRule::new(5.5, 70, Over, 0.7),
        LineRule::new(6.5, 91, Under, -1.0),
        LineRule::new(5.5, 84, Under, -0.7),
    ]
}

fn default_goal_rules() -> Vec<LineRule> {
    use Direction::{Over, Under};
    vec![
        LineRule::new(1.5, 93, Over, 0.6),
        LineRule::new(2.5, 84, Over, 0.6),
        LineRule::new(3.5, 71, Over, 0.6),
        LineRule::new(4.5, 91, Under, -1.0),
        LineRule::new(3.5, 82, Under, -0.6),
        LineRule::new(2.5, 68, Under, -0.4),
    ]
}

/// Frequency-threshold predictor over pre-cutoff aggregates.
///
/// Uses the home side's home split and the away side's away split, falling
/// back to the overall aggregate when a venue split is too thin.
#[derive(Debug, Clone, Default)]
pub struct ThresholdPredictor {
    pub config: PredictorConfig,
}

impl ThresholdPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    fn venue_or_overall<'a>(&self, venue: &'a TeamAggregate, overall: &'a TeamAggregate) -> &'a TeamAggregate {
        if venue.matches_played() >= self.config.min_matches {
            venue
        } else {
            overall
        }
    }

    fn predict_fixture(&self, input: &PredictionInput, fixture: &Fixture) -> Vec<Prediction> {
        let (Some(home_splits), Some(away_splits)) = (
            input.teams.get(&fixture.home_id),
            input.teams.get(&fixture.away_id),
        ) else {
            return Vec::new();
        };
        let home = self.venue_or_overall(&home_splits.home, &home_splits.overall);
        let away = self.venue_or_overall(&away_splits.away, &away_splits.overall);
        if home.matches_played().min(away.matches_played()) < self.config.min_matches {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut push = |market: Market, pick: Option<(Selection, u8)>| {
            if let Some((selection, confidence)) = pick {
                out.push(Prediction {
                    match_id: fixture.match_id,
                    market,
                    selection,
                    confidence,
                });
            }
        };

        let summed = |kind: StatKind| Some(home.own_average(kind)? + away.own_average(kind)?);
        push(
            Market::TotalCorners,
            summed(StatKind::Corners).and_then(|avg| best_line(&self.config.corners, avg)),
        );
        push(
            Market::TotalCards,
            summed(StatKind::Cards).and_then(|avg| best_line(&self.config.cards, avg)),
        );
        push(
            Market::TotalGoals,
            expected_goals(home, away).and_then(|xg| best_line(&self.config.goals, xg)),
        );
        push(Market::BothTeamsToScore, self.btts(home, away));

        for team_id in [fixture.home_id, fixture.away_id] {
            for p in self.player_props(input, fixture.match_id, team_id) {
                out.push(p);
            }
        }
        out
    }

    fn btts(&self, home: &TeamAggregate, away: &TeamAggregate) -> Option<(Selection, u8)> {
        let (h, a) = (home.rates?, away.rates?);
        let pct = (h.btts_pct + a.btts_pct) / 2.0;
        if pct > self.config.btts_yes_above {
            Some((Selection::Yes, ((pct * 1.30) as u32).min(95) as u8))
        } else if pct < self.config.btts_no_below {
            Some((Selection::No, (((100.0 - pct) * 1.35) as u32).min(95) as u8))
        } else {
            None
        }
    }

    fn player_props(&self, input: &PredictionInput, match_id: u64, team_id: u32) -> Vec<Prediction> {
        let Some(players) = input.players.get(&team_id) else {
            return Vec::new();
        };
        let mut cards = Vec::new();
        let mut goals = Vec::new();
        for p in players {
            if p.minutes < self.config.min_player_minutes {
                continue;
            }
            let Some(rates) = p.rates else {
                continue;
            };
            let position = input
                .positions
                .get(&p.player_id)
                .copied()
                .unwrap_or(PositionGroup::Unknown);
            if let Some(conf) = card_confidence(rates.cards_per_90, p.minutes, position)
                && conf >= self.config.min_player_confidence
            {
                cards.push(Prediction {
                    match_id,
                    market: Market::PlayerToBeBooked {
                        player_id: p.player_id,
                    },
                    selection: Selection::Yes,
                    confidence: conf,
                });
            }
            if let Some(conf) = goal_confidence(rates.goals_per_90, p.minutes)
                && conf >= self.config.min_player_confidence
            {
                goals.push(Prediction {
                    match_id,
                    market: Market::PlayerToScore {
                        player_id: p.player_id,
                    },
                    selection: Selection::Yes,
                    confidence: conf,
                });
            }
        }
        let limit = self.config.max_player_props_per_team;
        let mut out = Vec::new();
        for mut props in [cards, goals] {
            props.sort_by(|a, b| b.confidence.cmp(&a.confidence).then(a.market.cmp(&b.market)));
            props.truncate(limit);
            out.extend(props);
        }
        out
    }
}

impl Predictor for ThresholdPredictor {
    fn predict(&self, input: &PredictionInput) -> Vec<Prediction> {
        input
            .fixtures
            .iter()
            .flat_map(|fixture| self.predict_fixture(input, fixture))
            .collect()
    }
}

/// Highest-confidence rule that fires. Ties keep the earlier rule.
pub fn best_line(rules: &[LineRule], expected: f64) -> Option<(Selection, u8)> {
    let mut best: Option<&LineRule> = None;
    for rule in rules.iter().filter(|r| r.fires(expected)) {
        if best.is_none_or(|b| rule.confidence > b.confidence) {
            best = Some(rule);
        }
    }
    best.map(|r| (r.selection(), r.confidence))
}

/// Mean of each side's attack and the other side's defence.
fn expected_goals(home: &TeamAggregate, away: &TeamAggregate) -> Option<f64> {
    let (h, a) = (home.rates?, away.rates?);
    let home_goals = (h.goals_per_match + a.conceded_per_match) / 2.0;
    let away_goals = (a.goals_per_match + h.conceded_per_match) / 2.0;
    Some(home_goals + away_goals)
}

fn minutes_multiplier(minutes: u32) -> f64 {
    if minutes >= 1350 {
        1.0
    } else if minutes >= 900 {
        0.97
    } else {
        0.93
    }
}

fn card_confidence(cards_per_90: f64, minutes: u32, position: PositionGroup) -> Option<u8> {
    let base = if cards_per_90 >= 0.50 {
        75.0
    } else if cards_per_90 >= 0.40 {
        70.0
    } else if cards_per_90 >= 0.32 {
        65.0
    } else {
        return None;
    };
    let position_mult = match position {
        PositionGroup::Defender => 1.12,
        PositionGroup::Midfielder => 1.06,
        _ => 1.0,
    };
    Some((base * position_mult * minutes_multiplier(minutes)) as u8)
}

fn goal_confidence(goals_per_90: f64, minutes: u32) -> Option<u8> {
    let base = if goals_per_90 >= 0.75 {
        78.0
    } else if goals_per_90 >= 0.60 {
        73.0
    } else if goals_per_90 >= 0.45 {
        66.0
    } else {
        return None;
    };
    Some((base * minutes_multiplier(minutes)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_line_picks_highest_confidence_that_fires() {
        let rules = default_corner_rules();
        // 9.0 clears 5.5+2.5 and 6.5+2.0 but not 7.5+2.0.
        assert_eq!(best_line(&rules, 9.0), Some((Selection::Over(5.5), 96)));
        // Under 13.5 needs avg < 11.5.
        assert_eq!(best_line(&rules, 11.0), Some((Selection::Over(5.5), 96)));
        assert_eq!(best_line(&rules, 7.9), Some((Selection::Under(13.5), 91)));
    }

    #[test]
    fn player_confidence_applies_multipliers() {
        assert_eq!(card_confidence(0.55, 1400, PositionGroup::Defender), Some(84));
        assert_eq!(card_confidence(0.35, 500, PositionGroup::Forward), Some(60));
        assert_eq!(card_confidence(0.2, 2000, PositionGroup::Defender), None);
        assert_eq!(goal_confidence(0.8, 1000), Some(75));
    }

    #[test]
    fn bands() {
        assert_eq!(ConfidenceBand::of(96), ConfidenceBand::UltraSafe);
        assert_eq!(ConfidenceBand::of(75), ConfidenceBand::Safe);
        assert_eq!(ConfidenceBand::of(60), ConfidenceBand::Risky);
        assert_eq!(ConfidenceBand::of(59), ConfidenceBand::TooRisky);
    }
}
