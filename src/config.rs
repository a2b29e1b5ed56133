use std::env;
use std::path::PathBuf;

use crate::player::DEFAULT_MIN_MINUTES;

const CACHE_DIR: &str = "footy_stats";

/// Runtime settings shared by the binaries. Every value has a default and
/// numeric values are clamped to a sane range.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: Option<PathBuf>,
    pub league_key: Option<String>,
    pub season_id: Option<u32>,
    pub min_player_minutes: u32,
    pub min_matches: u32,
    pub parallelism: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            league_key: None,
            season_id: None,
            min_player_minutes: DEFAULT_MIN_MINUTES,
            min_matches: 3,
            parallelism: 4,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("FOOTY_DB_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            league_key: env::var("FOOTY_LEAGUE")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            season_id: env::var("FOOTY_SEASON")
                .ok()
                .and_then(|v| v.trim().parse::<u32>().ok()),
            min_player_minutes: env::var("FOOTY_MIN_PLAYER_MINUTES")
                .ok()
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(defaults.min_player_minutes)
                .clamp(0, 3420),
            min_matches: env::var("FOOTY_MIN_MATCHES")
                .ok()
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(defaults.min_matches)
                .clamp(1, 38),
            parallelism: env::var("FOOTY_PARALLELISM")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(defaults.parallelism)
                .clamp(1, 32),
        }
    }
}

/// `$XDG_CACHE_HOME/footy_stats`, else `$HOME/.cache/footy_stats`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

/// Loads `.env.local` then `.env`; missing files are fine.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Installs the stderr subscriber used by the binaries. `RUST_LOG` wins
/// over the default filter.
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("footy_stats=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
