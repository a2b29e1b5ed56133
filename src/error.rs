use thiserror::Error;

/// Structural failures surfaced by the pure pipeline.
///
/// Zero-data conditions are not errors: an empty aggregate is a sentinel
/// value and an unevaluable prediction is a verdict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("match {match_id} has no temporal ordinal for the requested cutoff")]
    MissingTemporalOrdinal { match_id: u64 },

    #[error("team {team_id} did not take part in match {match_id}")]
    UnknownTeam { team_id: u32, match_id: u64 },

    #[error("malformed record{}: {reason}", fmt_match_id(.match_id))]
    MalformedRecord {
        match_id: Option<u64>,
        reason: String,
    },

    #[error("complete match {match_id} has no final score")]
    MissingScore { match_id: u64 },
}

impl StatsError {
    pub fn malformed(match_id: Option<u64>, reason: impl Into<String>) -> Self {
        StatsError::MalformedRecord {
            match_id,
            reason: reason.into(),
        }
    }
}

fn fmt_match_id(id: &Option<u64>) -> String {
    match id {
        Some(id) => format!(" (match {id})"),
        None => String::new(),
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
