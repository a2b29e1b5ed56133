use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{AggregateScope, round2};
use crate::error::StatsError;
use crate::normalize::team_view;
use crate::records::{CardKind, GoalKind, MatchRecord, PlayerRecord, SideRecord};

pub const MATCH_MINUTES: u32 = 90;
pub const DEFAULT_MIN_MINUTES: u32 = 450;

/// How one player featured in one match, derived from lineup, bench and
/// card entries of their side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appearance {
    pub started: bool,
    pub minutes: u32,
}

pub fn appearance(side: &SideRecord, player_id: u32) -> Option<Appearance> {
    let started = side.lineup.iter().any(|p| p.player_id == player_id);
    // Unused substitutes are listed without a player going off.
    let came_on = side
        .bench
        .iter()
        .find(|s| s.player_in == player_id && s.player_out.is_some());
    if !started && came_on.is_none() {
        return None;
    }

    let start = match came_on {
        Some(sub) if !started => sub.minute.unwrap_or(MATCH_MINUTES),
        _ => 0,
    };
    let went_off = side
        .bench
        .iter()
        .filter(|s| s.player_out == Some(player_id))
        .filter_map(|s| s.minute)
        .min();
    let sent_off = side
        .cards
        .iter()
        .filter(|c| c.player_id == player_id && c.kind.is_dismissal())
        .filter_map(|c| c.minute)
        .min();
    let end = [went_off, sent_off]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(MATCH_MINUTES)
        .min(MATCH_MINUTES);

    Some(Appearance {
        started,
        minutes: end.saturating_sub(start),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerRates {
    pub goals_per_90: f64,
    pub assists_per_90: f64,
    pub cards_per_90: f64,
    pub minutes_per_goal: Option<f64>,
    pub minutes_per_card: Option<f64>,
}

impl PlayerRates {
    fn from_totals(minutes: u32, goals: u32, assists: u32, cards: u32) -> Option<Self> {
        if minutes == 0 {
            return None;
        }
        let mins = f64::from(minutes);
        let per_90 = |count: u32| round2(f64::from(count) * 90.0 / mins);
        let per_event = |count: u32| (count > 0).then(|| round2(mins / f64::from(count)));
        Some(PlayerRates {
            goals_per_90: per_90(goals),
            assists_per_90: per_90(assists),
            cards_per_90: per_90(cards),
            minutes_per_goal: per_event(goals),
            minutes_per_card: per_event(cards),
        })
    }
}

/// Per-player fold over match detail entries. `rates` is `None` when the
/// player logged no minutes in the folded set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAggregate {
    pub player_id: u32,
    pub team_id: Option<u32>,
    pub appearances: u32,
    pub starts: u32,
    pub sub_appearances: u32,
    pub minutes: u32,
    pub goals: u32,
    pub assists: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub match_ids: Vec<u64>,
    pub rates: Option<PlayerRates>,
}

impl PlayerAggregate {
    pub fn empty(player_id: u32) -> Self {
        Self {
            player_id,
            team_id: None,
            appearances: 0,
            starts: 0,
            sub_appearances: 0,
            minutes: 0,
            goals: 0,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
            match_ids: Vec::new(),
            rates: None,
        }
    }

    pub fn cards(&self) -> u32 {
        self.yellow_cards + self.red_cards
    }

    fn fold_side(&mut self, record: &MatchRecord, team_id: u32, side: &SideRecord) {
        let Some(app) = appearance(side, self.player_id) else {
            return;
        };
        self.team_id = Some(team_id);
        self.appearances += 1;
        if app.started {
            self.starts += 1;
        } else {
            self.sub_appearances += 1;
        }
        self.minutes += app.minutes;
        self.match_ids.push(record.id);

        for goal in &side.goals {
            if goal.player_id == self.player_id && goal.kind != GoalKind::OwnGoal {
                self.goals += 1;
            }
            if goal.assist_player_id == Some(self.player_id) {
                self.assists += 1;
            }
        }
        for card in side.cards.iter().filter(|c| c.player_id == self.player_id) {
            match card.kind {
                CardKind::Yellow => self.yellow_cards += 1,
                CardKind::SecondYellow | CardKind::Red => self.red_cards += 1,
            }
        }
    }

    fn finish(&mut self) {
        self.rates = PlayerRates::from_totals(self.minutes, self.goals, self.assists, self.cards());
    }
}

/// Folds every match in scope for one player, whichever side they played on.
pub fn aggregate_player<'a, I>(player_id: u32, matches: I, scope: &AggregateScope) -> PlayerAggregate
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut out = PlayerAggregate::empty(player_id);
    for record in matches {
        for (team_id, side) in [
            (record.home_id, &record.team_a),
            (record.away_id, &record.team_b),
        ] {
            if appearance(side, player_id).is_none() {
                continue;
            }
            let Ok(view) = team_view(record, team_id) else {
                continue;
            };
            if scope.admits(&view) {
                out.fold_side(record, team_id, side);
            }
        }
    }
    out.finish();
    out
}

/// Aggregates for every player who appeared for `team_id`, ordered by id.
pub fn aggregate_team_players<'a, I>(
    team_id: u32,
    matches: I,
    scope: &AggregateScope,
) -> Result<Vec<PlayerAggregate>, StatsError>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut by_player: BTreeMap<u32, PlayerAggregate> = BTreeMap::new();
    for record in matches {
        let view = team_view(record, team_id)?;
        if !scope.admits(&view) {
            continue;
        }
        let ids = view
            .own
            .lineup
            .iter()
            .map(|p| p.player_id)
            .chain(view.own.bench.iter().map(|s| s.player_in));
        for player_id in ids {
            let entry = by_player
                .entry(player_id)
                .or_insert_with(|| PlayerAggregate::empty(player_id));
            if entry.match_ids.last() == Some(&record.id) {
                continue;
            }
            entry.fold_side(record, team_id, view.own);
        }
    }
    let mut out: Vec<PlayerAggregate> = by_player
        .into_values()
        .filter(|p| p.appearances > 0)
        .collect();
    for p in &mut out {
        p.finish();
    }
    Ok(out)
}

/// Per-90 rates from season totals, once the player has `min_minutes`.
pub fn season_rates(player: &PlayerRecord, min_minutes: u32) -> Option<PlayerRates> {
    if player.minutes < min_minutes {
        return None;
    }
    PlayerRates::from_totals(player.minutes, player.goals, player.assists, player.cards)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerMetric {
    Goals,
    Assists,
    Cards,
    GoalsPer90,
    AssistsPer90,
    CardsPer90,
}

impl PlayerMetric {
    fn is_rate(self) -> bool {
        matches!(
            self,
            PlayerMetric::GoalsPer90 | PlayerMetric::AssistsPer90 | PlayerMetric::CardsPer90
        )
    }

    fn value(self, player: &PlayerRecord, min_minutes: u32) -> Option<f64> {
        match self {
            PlayerMetric::Goals => Some(f64::from(player.goals)),
            PlayerMetric::Assists => Some(f64::from(player.assists)),
            PlayerMetric::Cards => Some(f64::from(player.cards)),
            PlayerMetric::GoalsPer90 => season_rates(player, min_minutes).map(|r| r.goals_per_90),
            PlayerMetric::AssistsPer90 => {
                season_rates(player, min_minutes).map(|r| r.assists_per_90)
            }
            PlayerMetric::CardsPer90 => season_rates(player, min_minutes).map(|r| r.cards_per_90),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedPlayer<'a> {
    pub player: &'a PlayerRecord,
    pub value: f64,
}

/// Top `n` players by `metric`. Rate metrics only consider players above
/// `min_minutes`; players with a zero value are left out.
pub fn top_performers(
    players: &[PlayerRecord],
    metric: PlayerMetric,
    n: usize,
    min_minutes: u32,
) -> Vec<RankedPlayer<'_>> {
    let mut ranked: Vec<RankedPlayer<'_>> = players
        .iter()
        .filter(|p| !metric.is_rate() || p.minutes >= min_minutes)
        .filter_map(|p| {
            let value = metric.value(p, min_minutes)?;
            (value > 0.0).then_some(RankedPlayer { player: p, value })
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.player.id.cmp(&b.player.id))
    });
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CardDetail, LineupEntry, Substitution};

    fn starter(id: u32) -> LineupEntry {
        LineupEntry {
            player_id: id,
            shirt_number: None,
            events: Vec::new(),
        }
    }

    #[test]
    fn substitution_splits_minutes() {
        let side = SideRecord {
            lineup: vec![starter(10), starter(11)],
            bench: vec![
                Substitution {
                    player_in: 20,
                    player_out: Some(10),
                    minute: Some(60),
                },
                Substitution {
                    player_in: 21,
                    player_out: None,
                    minute: None,
                },
            ],
            ..SideRecord::default()
        };
        assert_eq!(
            appearance(&side, 10),
            Some(Appearance {
                started: true,
                minutes: 60
            })
        );
        assert_eq!(
            appearance(&side, 20),
            Some(Appearance {
                started: false,
                minutes: 30
            })
        );
        assert_eq!(appearance(&side, 11).map(|a| a.minutes), Some(90));
        assert_eq!(appearance(&side, 21), None);
    }

    #[test]
    fn red_card_ends_appearance() {
        let side = SideRecord {
            lineup: vec![starter(5)],
            cards: vec![CardDetail {
                player_id: 5,
                kind: CardKind::Red,
                minute: Some(35),
            }],
            ..SideRecord::default()
        };
        assert_eq!(appearance(&side, 5).map(|a| a.minutes), Some(35));
    }

    #[test]
    fn season_rates_respect_floor() {
        let p = PlayerRecord {
            id: 1,
            name: "Nine".to_string(),
            position: Some("Forward".to_string()),
            club_team_id: Some(1),
            appearances: 10,
            minutes: 900,
            goals: 6,
            assists: 2,
            cards: 3,
            yellow_cards: 3,
            red_cards: 0,
        };
        let rates = season_rates(&p, 450).unwrap();
        assert_eq!(rates.goals_per_90, 0.6);
        assert_eq!(rates.minutes_per_goal, Some(150.0));
        assert!(season_rates(&p, 1000).is_none());
    }
}
