use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Complete,
    Incomplete,
    Postponed,
}

impl MatchStatus {
    pub fn from_provider(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "complete" => Some(MatchStatus::Complete),
            "incomplete" | "fixture" => Some(MatchStatus::Incomplete),
            "postponed" | "suspended" | "canceled" | "cancelled" => Some(MatchStatus::Postponed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Complete => "complete",
            MatchStatus::Incomplete => "incomplete",
            MatchStatus::Postponed => "postponed",
        }
    }
}

/// Provider coverage flag for one statistic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    #[default]
    Absent,
    Partial,
    Full,
}

impl QualityLevel {
    pub fn from_code(code: i64) -> Self {
        match code {
            c if c >= 2 => QualityLevel::Full,
            1 => QualityLevel::Partial,
            _ => QualityLevel::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFamily {
    Corners,
    Cards,
    Attacks,
    GoalTimings,
    Penalties,
    Throwins,
    Freekicks,
    Goalkicks,
}

impl QualityFamily {
    pub const ALL: [QualityFamily; 8] = [
        QualityFamily::Corners,
        QualityFamily::Cards,
        QualityFamily::Attacks,
        QualityFamily::GoalTimings,
        QualityFamily::Penalties,
        QualityFamily::Throwins,
        QualityFamily::Freekicks,
        QualityFamily::Goalkicks,
    ];

    pub fn provider_key(self) -> &'static str {
        match self {
            QualityFamily::Corners => "corner_timings_recorded",
            QualityFamily::Cards => "card_timings_recorded",
            QualityFamily::Attacks => "attacks_recorded",
            QualityFamily::GoalTimings => "goal_timings_recorded",
            QualityFamily::Penalties => "pens_recorded",
            QualityFamily::Throwins => "throwins_recorded",
            QualityFamily::Freekicks => "freekicks_recorded",
            QualityFamily::Goalkicks => "goalkicks_recorded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DataQuality {
    pub corners: QualityLevel,
    pub cards: QualityLevel,
    pub attacks: QualityLevel,
    pub goal_timings: QualityLevel,
    pub penalties: QualityLevel,
    pub throwins: QualityLevel,
    pub freekicks: QualityLevel,
    pub goalkicks: QualityLevel,
}

impl DataQuality {
    pub fn level(&self, family: QualityFamily) -> QualityLevel {
        match family {
            QualityFamily::Corners => self.corners,
            QualityFamily::Cards => self.cards,
            QualityFamily::Attacks => self.attacks,
            QualityFamily::GoalTimings => self.goal_timings,
            QualityFamily::Penalties => self.penalties,
            QualityFamily::Throwins => self.throwins,
            QualityFamily::Freekicks => self.freekicks,
            QualityFamily::Goalkicks => self.goalkicks,
        }
    }

    pub fn set(&mut self, family: QualityFamily, level: QualityLevel) {
        let slot = match family {
            QualityFamily::Corners => &mut self.corners,
            QualityFamily::Cards => &mut self.cards,
            QualityFamily::Attacks => &mut self.attacks,
            QualityFamily::GoalTimings => &mut self.goal_timings,
            QualityFamily::Penalties => &mut self.penalties,
            QualityFamily::Throwins => &mut self.throwins,
            QualityFamily::Freekicks => &mut self.freekicks,
            QualityFamily::Goalkicks => &mut self.goalkicks,
        };
        *slot = level;
    }
}

/// Per-side statistic fields. `None` means the provider did not record it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamStats {
    pub goals: Option<u32>,
    pub ht_goals: Option<u32>,
    pub corners: Option<u32>,
    pub fh_corners: Option<u32>,
    pub sh_corners: Option<u32>,
    pub shots: Option<u32>,
    pub shots_on_target: Option<u32>,
    pub shots_off_target: Option<u32>,
    pub cards: Option<u32>,
    pub yellow_cards: Option<u32>,
    pub red_cards: Option<u32>,
    pub possession: Option<u32>,
    pub fouls: Option<u32>,
    pub offsides: Option<u32>,
    pub attacks: Option<u32>,
    pub dangerous_attacks: Option<u32>,
    pub xg: Option<f64>,
    pub throwins: Option<u32>,
    pub freekicks: Option<u32>,
    pub goalkicks: Option<u32>,
    pub penalty_goals: Option<u32>,
}

impl TeamStats {
    pub fn get(&self, kind: StatKind) -> Option<f64> {
        let count = match kind {
            StatKind::Goals => self.goals,
            StatKind::HalfTimeGoals => self.ht_goals,
            StatKind::Corners => self.corners,
            StatKind::FirstHalfCorners => self.fh_corners,
            StatKind::SecondHalfCorners => self.sh_corners,
            StatKind::Shots => self.shots,
            StatKind::ShotsOnTarget => self.shots_on_target,
            StatKind::ShotsOffTarget => self.shots_off_target,
            StatKind::Cards => self.cards,
            StatKind::YellowCards => self.yellow_cards,
            StatKind::RedCards => self.red_cards,
            StatKind::Possession => self.possession,
            StatKind::Fouls => self.fouls,
            StatKind::Offsides => self.offsides,
            StatKind::Attacks => self.attacks,
            StatKind::DangerousAttacks => self.dangerous_attacks,
            StatKind::ExpectedGoals => return self.xg,
            StatKind::Throwins => self.throwins,
            StatKind::Freekicks => self.freekicks,
            StatKind::Goalkicks => self.goalkicks,
            StatKind::PenaltyGoals => self.penalty_goals,
        };
        count.map(f64::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Goals,
    HalfTimeGoals,
    Corners,
    FirstHalfCorners,
    SecondHalfCorners,
    Shots,
    ShotsOnTarget,
    ShotsOffTarget,
    Cards,
    YellowCards,
    RedCards,
    Possession,
    Fouls,
    Offsides,
    Attacks,
    DangerousAttacks,
    ExpectedGoals,
    Throwins,
    Freekicks,
    Goalkicks,
    PenaltyGoals,
}

impl StatKind {
    pub const ALL: [StatKind; 21] = [
        StatKind::Goals,
        StatKind::HalfTimeGoals,
        StatKind::Corners,
        StatKind::FirstHalfCorners,
        StatKind::SecondHalfCorners,
        StatKind::Shots,
        StatKind::ShotsOnTarget,
        StatKind::ShotsOffTarget,
        StatKind::Cards,
        StatKind::YellowCards,
        StatKind::RedCards,
        StatKind::Possession,
        StatKind::Fouls,
        StatKind::Offsides,
        StatKind::Attacks,
        StatKind::DangerousAttacks,
        StatKind::ExpectedGoals,
        StatKind::Throwins,
        StatKind::Freekicks,
        StatKind::Goalkicks,
        StatKind::PenaltyGoals,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatKind::Goals => "Goals",
            StatKind::HalfTimeGoals => "HT goals",
            StatKind::Corners => "Corners",
            StatKind::FirstHalfCorners => "1H corners",
            StatKind::SecondHalfCorners => "2H corners",
            StatKind::Shots => "Shots",
            StatKind::ShotsOnTarget => "Shots on target",
            StatKind::ShotsOffTarget => "Shots off target",
            StatKind::Cards => "Cards",
            StatKind::YellowCards => "Yellow cards",
            StatKind::RedCards => "Red cards",
            StatKind::Possession => "Possession %",
            StatKind::Fouls => "Fouls",
            StatKind::Offsides => "Offsides",
            StatKind::Attacks => "Attacks",
            StatKind::DangerousAttacks => "Dangerous attacks",
            StatKind::ExpectedGoals => "xG",
            StatKind::Throwins => "Throw-ins",
            StatKind::Freekicks => "Free kicks",
            StatKind::Goalkicks => "Goal kicks",
            StatKind::PenaltyGoals => "Penalty goals",
        }
    }

    /// Quality family whose indicator describes how this statistic was collected.
    pub fn quality_family(self) -> Option<QualityFamily> {
        match self {
            StatKind::Corners | StatKind::FirstHalfCorners | StatKind::SecondHalfCorners => {
                Some(QualityFamily::Corners)
            }
            StatKind::Cards | StatKind::YellowCards | StatKind::RedCards => {
                Some(QualityFamily::Cards)
            }
            StatKind::Attacks | StatKind::DangerousAttacks => Some(QualityFamily::Attacks),
            StatKind::HalfTimeGoals => Some(QualityFamily::GoalTimings),
            StatKind::PenaltyGoals => Some(QualityFamily::Penalties),
            StatKind::Throwins => Some(QualityFamily::Throwins),
            StatKind::Freekicks => Some(QualityFamily::Freekicks),
            StatKind::Goalkicks => Some(QualityFamily::Goalkicks),
            _ => None,
        }
    }

    /// Possession is a share, so a match total is meaningless.
    pub fn is_summable(self) -> bool {
        !matches!(self, StatKind::Possession)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerEvent {
    pub kind: String,
    pub minute: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineupEntry {
    pub player_id: u32,
    pub shirt_number: Option<u32>,
    pub events: Vec<PlayerEvent>,
}

/// Bench entry: `player_in` replaced `player_out` at `minute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub player_in: u32,
    pub player_out: Option<u32>,
    pub minute: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Regular,
    Penalty,
    OwnGoal,
}

impl GoalKind {
    pub fn from_provider(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.contains("own") {
            GoalKind::OwnGoal
        } else if lower.contains("pen") {
            GoalKind::Penalty
        } else {
            GoalKind::Regular
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalDetail {
    pub player_id: u32,
    pub assist_player_id: Option<u32>,
    pub minute: Option<u32>,
    pub kind: GoalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Yellow,
    SecondYellow,
    Red,
}

impl CardKind {
    pub fn from_provider(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yellow" => Some(CardKind::Yellow),
            "second yellow" => Some(CardKind::SecondYellow),
            "red" => Some(CardKind::Red),
            _ => None,
        }
    }

    pub fn is_dismissal(self) -> bool {
        matches!(self, CardKind::SecondYellow | CardKind::Red)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardDetail {
    pub player_id: u32,
    pub kind: CardKind,
    pub minute: Option<u32>,
}

/// Everything recorded for one side of a match (team_a = home, team_b = away).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SideRecord {
    pub stats: TeamStats,
    pub lineup: Vec<LineupEntry>,
    pub bench: Vec<Substitution>,
    pub goals: Vec<GoalDetail>,
    pub cards: Vec<CardDetail>,
}

impl SideRecord {
    /// Whether player-level detail (lineup or event lists) was supplied at all.
    pub fn has_details(&self) -> bool {
        !self.lineup.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct H2hSummary {
    pub team_a_wins: u32,
    pub team_b_wins: u32,
    pub draws: u32,
    pub total_matches: u32,
    pub btts_pct: Option<f64>,
    pub over25_pct: Option<f64>,
    pub avg_goals: Option<f64>,
}

/// One played or scheduled fixture. Built once by the parser and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub id: u64,
    pub home_id: u32,
    pub away_id: u32,
    pub home_name: String,
    pub away_name: String,
    pub game_week: Option<u32>,
    pub status: MatchStatus,
    pub date_unix: Option<i64>,
    pub competition: Option<String>,
    pub total_goals: Option<u32>,
    pub quality: DataQuality,
    pub team_a: SideRecord,
    pub team_b: SideRecord,
    pub h2h: Option<H2hSummary>,
}

impl MatchRecord {
    pub fn is_complete(&self) -> bool {
        self.status == MatchStatus::Complete
    }

    pub fn involves(&self, team_id: u32) -> bool {
        self.home_id == team_id || self.away_id == team_id
    }

    pub fn score(&self) -> Option<(u32, u32)> {
        Some((self.team_a.stats.goals?, self.team_b.stats.goals?))
    }

    pub fn kickoff(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date_unix?, 0)
    }

    pub fn team_name(&self, team_id: u32) -> Option<&str> {
        if team_id == self.home_id {
            Some(&self.home_name)
        } else if team_id == self.away_id {
            Some(&self.away_name)
        } else {
            None
        }
    }

    /// Sum of both sides, present only when both sides recorded the statistic.
    pub fn match_total(&self, kind: StatKind) -> Option<f64> {
        if !kind.is_summable() {
            return None;
        }
        Some(self.team_a.stats.get(kind)? + self.team_b.stats.get(kind)?)
    }
}

/// Season-cumulative player figures as supplied by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    pub id: u32,
    pub name: String,
    pub position: Option<String>,
    pub club_team_id: Option<u32>,
    pub appearances: u32,
    pub minutes: u32,
    pub goals: u32,
    pub assists: u32,
    pub cards: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionGroup {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Unknown,
}

impl PositionGroup {
    pub fn from_label(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return PositionGroup::Unknown;
        };
        let lower = raw.to_ascii_lowercase();
        if lower.contains("goalkeeper") || lower == "gk" {
            PositionGroup::Goalkeeper
        } else if lower.contains("defender") || lower.contains("back") {
            PositionGroup::Defender
        } else if lower.contains("midfielder") {
            PositionGroup::Midfielder
        } else if lower.contains("forward") || lower.contains("striker") || lower.contains("wing")
        {
            PositionGroup::Forward
        } else {
            PositionGroup::Unknown
        }
    }
}

impl PlayerRecord {
    pub fn position_group(&self) -> PositionGroup {
        PositionGroup::from_label(self.position.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueTableRow {
    pub team_id: u32,
    pub name: String,
    pub position: Option<u32>,
    pub played: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_provider_aliases() {
        assert_eq!(
            MatchStatus::from_provider("complete"),
            Some(MatchStatus::Complete)
        );
        assert_eq!(
            MatchStatus::from_provider("fixture"),
            Some(MatchStatus::Incomplete)
        );
        assert_eq!(
            MatchStatus::from_provider("Cancelled"),
            Some(MatchStatus::Postponed)
        );
        assert_eq!(MatchStatus::from_provider("abandoned?"), None);
    }

    #[test]
    fn quality_codes_map_to_levels() {
        assert_eq!(QualityLevel::from_code(-1), QualityLevel::Absent);
        assert_eq!(QualityLevel::from_code(1), QualityLevel::Partial);
        assert_eq!(QualityLevel::from_code(2), QualityLevel::Full);
        assert!(QualityLevel::Full > QualityLevel::Partial);
    }

    #[test]
    fn position_groups() {
        assert_eq!(
            PositionGroup::from_label(Some("Defender")),
            PositionGroup::Defender
        );
        assert_eq!(
            PositionGroup::from_label(Some("Left Back")),
            PositionGroup::Defender
        );
        assert_eq!(PositionGroup::from_label(None), PositionGroup::Unknown);
    }
}
