//! Football match statistics and gameweek backtesting.
//!
//! Raw provider records are parsed once into [`records::MatchRecord`]s, then
//! narrowed by the temporal and status filters, projected onto a team-relative
//! view and folded into aggregates. The backtest harness replays that pipeline
//! for a past gameweek and scores predictions against the withheld results.

pub mod aggregate;
pub mod backtest;
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod normalize;
pub mod parse;
pub mod player;
pub mod predict;
pub mod records;
pub mod report;
pub mod sqlite_store;
pub mod store;

pub use error::{StatsError, StatsResult};
