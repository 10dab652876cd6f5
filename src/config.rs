use crate::error::{AppError, Result};

pub const RAW_QUOTES_SOURCE: &str = "data/betting_odds_raw.csv";
pub const TOP_BETS_SOURCE: &str = "data/top_bets.csv";

/// Minimum valid prices a bet cohort must carry before consensus statistics
/// are computed. Thinner cohorts are discarded without producing a result —
/// a single stray price in a two-bookmaker market is not an outlier signal.
pub const MIN_COHORT_SIZE: usize = 10;

/// Value-bet results are ranked and truncated to this many rows.
pub const TOP_BETS_LIMIT: usize = 50;

/// HTTP fetch timeout for remote CSV sources (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Fixed allow-list of local bookmakers. Used by the `local_only` filter to
/// restrict any computation to books the bettor can actually reach.
pub const LOCAL_BOOKMAKERS: &[&str] = &[
    "Betr",
    "Ladbrokes",
    "Pointsbet (AU)",
    "Sportsbet",
    "TAB",
    "Unibet",
    "TABTouch",
];

/// Market codes grouped by stat category, as quoted by the odds feed.
pub mod market_categories {
    pub const POINTS: &[&str] = &["player_points", "player_points_alternate"];
    pub const REBOUNDS: &[&str] = &["player_rebounds", "player_rebounds_alternate"];
    pub const ASSISTS: &[&str] = &["player_assists", "player_assists_alternate"];
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Raw quote CSV — a local path or an http(s) URL (RAW_QUOTES_SOURCE).
    pub raw_quotes_source: String,
    /// Optional precomputed top-bets CSV (TOP_BETS_SOURCE). When missing or
    /// unreadable the engine derives the same table from raw quotes.
    pub top_bets_source: String,
    pub log_level: String,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            raw_quotes_source: std::env::var("RAW_QUOTES_SOURCE")
                .unwrap_or_else(|_| RAW_QUOTES_SOURCE.to_string()),
            top_bets_source: std::env::var("TOP_BETS_SOURCE")
                .unwrap_or_else(|_| TOP_BETS_SOURCE.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
        })
    }
}
