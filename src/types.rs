use serde::{Deserialize, Serialize};

use crate::format::format_point;

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// One bookmaker's price for one outcome of one player-prop line.
/// Immutable after normalization — every derived table is computed fresh
/// from a quote set, nothing mutates in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// "{home_team} vs {away_team}", derived at the loader boundary.
    pub game: String,
    /// Player description string as quoted by the feed.
    pub player: String,
    /// Market category code, e.g. `player_points`.
    pub market: String,
    /// Numeric line, may be fractional (25.5).
    pub point: f64,
    pub label: OutcomeLabel,
    pub bookmaker: String,
    /// Decimal odds. Guaranteed positive and finite after normalization.
    pub price: f64,
}

impl Quote {
    pub fn bet_key(&self) -> BetKey {
        BetKey {
            player: self.player.clone(),
            label: self.label,
            market: self.market.clone(),
            point: PointKey::from_point(self.point),
        }
    }

    pub fn line_key(&self) -> LineKey {
        LineKey {
            game: self.game.clone(),
            player: self.player.clone(),
            market: self.market.clone(),
            point: PointKey::from_point(self.point),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeLabel {
    Over,
    Under,
}

impl OutcomeLabel {
    /// Case-insensitive parse. Anything other than over/under is rejected —
    /// the matcher and detector only understand two-sided lines.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("over") {
            Some(OutcomeLabel::Over)
        } else if s.eq_ignore_ascii_case("under") {
            Some(OutcomeLabel::Under)
        } else {
            None
        }
    }
}

impl std::fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutcomeLabel::Over => "over",
            OutcomeLabel::Under => "under",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Composite cohort keys
// ---------------------------------------------------------------------------

/// Line value stored as integer hundredths: `(point * 100).round() as i64`.
/// Gives the key types Eq + Ord + Hash without floating-point map keys,
/// while keeping half-point lines (25.5) exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointKey(i64);

impl PointKey {
    pub fn from_point(point: f64) -> Self {
        Self((point * 100.0).round() as i64)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl std::fmt::Display for PointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_point(self.as_f64()))
    }
}

/// Value-bet cohort key: every bookmaker quoting the *same specific bet*.
/// A struct key rather than a joined string — separator characters inside a
/// player name can never collide two distinct bets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BetKey {
    pub player: String,
    pub label: OutcomeLabel,
    pub market: String,
    pub point: PointKey,
}

impl BetKey {
    /// Canonical string id used in API payloads and the precomputed table.
    pub fn canonical(&self) -> String {
        format!("{}_{}_{}_{}", self.player, self.label, self.market, self.point)
    }
}

/// Arbitrage cohort key: label-agnostic, so over and under quotes for the
/// same line land in one group and can be paired.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineKey {
    pub game: String,
    pub player: String,
    pub market: String,
    pub point: PointKey,
}

// ---------------------------------------------------------------------------
// Engine results
// ---------------------------------------------------------------------------

/// One qualifying value-bet cohort: the max price cleared mean + 1 sample std.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueBetResult {
    /// Canonical bet id (see [`BetKey::canonical`]).
    pub bet: String,
    pub bet_display: String,
    pub max_price: f64,
    /// Bookmaker holding the max price. Ties broken by lexicographically
    /// smallest name so output never depends on input ordering.
    pub bookmaker: String,
    pub mean_price: f64,
    /// mean + 1 sample standard deviation.
    pub threshold: f64,
    pub sample_size: usize,
    pub above_threshold: f64,
    /// 100 / mean_price.
    pub consensus_prob: f64,
    /// 100 / max_price.
    pub implied_prob: f64,
    /// implied - consensus. More negative = priced more generously than
    /// the pack — the core value signal, sorted ascending.
    pub prob_diff: f64,
}

/// One over/under price combination whose implied probabilities sum under 100%.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitragePair {
    pub game: String,
    pub player: String,
    pub market: String,
    pub market_display: String,
    pub point: f64,
    pub point_display: String,
    pub over_bookmaker: String,
    pub over_price: f64,
    pub under_bookmaker: String,
    pub under_price: f64,
    /// (1/over + 1/under) * 100, rounded to 2dp.
    pub implied_total_pct: f64,
    /// (1 - implied_total) * 100, rounded to 2dp.
    pub edge_pct: f64,
}

/// Two-sided stake allocation for a matched pair and a target gross return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeSolution {
    pub stake_over: f64,
    pub stake_under: f64,
    /// Net profit on the over side alone: stake_over * (price_over - 1).
    pub return_over: f64,
    pub return_under: f64,
    /// Profit assuming the under side wins, net of both stakes.
    pub total_profit: f64,
}

// ---------------------------------------------------------------------------
// Price distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    /// Price rounded to 2 decimals.
    pub price: f64,
    pub count: u32,
}

/// count/mean/std/min/max plus a frequency histogram for a price set.
/// Empty input is count = 0 with null statistics, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub histogram: Vec<HistogramBucket>,
}

impl PriceSummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: None,
            std: None,
            min: None,
            max: None,
            histogram: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parse_is_case_insensitive() {
        assert_eq!(OutcomeLabel::parse("Over"), Some(OutcomeLabel::Over));
        assert_eq!(OutcomeLabel::parse("UNDER"), Some(OutcomeLabel::Under));
        assert_eq!(OutcomeLabel::parse("yes"), None);
        assert_eq!(OutcomeLabel::parse(""), None);
    }

    #[test]
    fn point_key_keeps_half_points_exact() {
        let a = PointKey::from_point(25.5);
        let b = PointKey::from_point(25.5);
        assert_eq!(a, b);
        assert!((a.as_f64() - 25.5).abs() < 1e-9);
        assert_ne!(PointKey::from_point(25.0), PointKey::from_point(25.5));
    }

    #[test]
    fn bet_keys_with_separator_in_player_name_do_not_collide() {
        let q1 = Quote {
            game: "A vs B".to_string(),
            player: "J_Smith over".to_string(),
            market: "player_points".to_string(),
            point: 10.5,
            label: OutcomeLabel::Over,
            bookmaker: "TAB".to_string(),
            price: 1.9,
        };
        let mut q2 = q1.clone();
        q2.player = "J_Smith".to_string();
        q2.market = "over_player_points".to_string();
        assert_ne!(q1.bet_key(), q2.bet_key());
    }

    #[test]
    fn canonical_bet_id_strips_trailing_zero_point() {
        let key = BetKey {
            player: "LeBron James".to_string(),
            label: OutcomeLabel::Over,
            market: "player_points".to_string(),
            point: PointKey::from_point(25.0),
        };
        assert_eq!(key.canonical(), "LeBron James_over_player_points_25");
    }
}
