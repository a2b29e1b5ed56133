use serde::Serialize;

use crate::error::StatsError;
use crate::records::{MatchRecord, SideRecord, StatKind, TeamStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Home,
    Away,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::Home => Orientation::Away,
            Orientation::Away => Orientation::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}

impl MatchResult {
    pub fn points(self) -> u32 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Draw => 1,
            MatchResult::Loss => 0,
        }
    }

    pub fn letter(self) -> char {
        match self {
            MatchResult::Win => 'W',
            MatchResult::Draw => 'D',
            MatchResult::Loss => 'L',
        }
    }
}

/// A match seen from one participant. `own` and `opponent` borrow the
/// team_a/team_b side records of the underlying match.
#[derive(Debug, Clone, Copy)]
pub struct TeamView<'a> {
    pub record: &'a MatchRecord,
    pub team_id: u32,
    pub orientation: Orientation,
    pub own: &'a SideRecord,
    pub opponent: &'a SideRecord,
}

pub fn team_view(record: &MatchRecord, team_id: u32) -> Result<TeamView<'_>, StatsError> {
    let (orientation, own, opponent) = if team_id == record.home_id {
        (Orientation::Home, &record.team_a, &record.team_b)
    } else if team_id == record.away_id {
        (Orientation::Away, &record.team_b, &record.team_a)
    } else {
        return Err(StatsError::UnknownTeam {
            team_id,
            match_id: record.id,
        });
    };
    Ok(TeamView {
        record,
        team_id,
        orientation,
        own,
        opponent,
    })
}

impl<'a> TeamView<'a> {
    pub fn own_stats(&self) -> &'a TeamStats {
        &self.own.stats
    }

    pub fn opponent_stats(&self) -> &'a TeamStats {
        &self.opponent.stats
    }

    pub fn opponent_id(&self) -> u32 {
        match self.orientation {
            Orientation::Home => self.record.away_id,
            Orientation::Away => self.record.home_id,
        }
    }

    pub fn opponent_name(&self) -> &'a str {
        match self.orientation {
            Orientation::Home => &self.record.away_name,
            Orientation::Away => &self.record.home_name,
        }
    }

    pub fn is_home(&self) -> bool {
        self.orientation == Orientation::Home
    }

    pub fn goals_for(&self) -> Option<u32> {
        self.own.stats.goals
    }

    pub fn goals_against(&self) -> Option<u32> {
        self.opponent.stats.goals
    }

    pub fn result(&self) -> Option<MatchResult> {
        let (gf, ga) = (self.goals_for()?, self.goals_against()?);
        Some(if gf > ga {
            MatchResult::Win
        } else if gf < ga {
            MatchResult::Loss
        } else {
            MatchResult::Draw
        })
    }

    pub fn own_stat(&self, kind: StatKind) -> Option<f64> {
        self.own.stats.get(kind)
    }

    pub fn opponent_stat(&self, kind: StatKind) -> Option<f64> {
        self.opponent.stats.get(kind)
    }
}
