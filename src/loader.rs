use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::FETCH_TIMEOUT_SECS;
use crate::engine::round2;
use crate::error::{AppError, Result};
use crate::format::format_bet_id_display;
use crate::types::{OutcomeLabel, Quote, ValueBetResult};

// ---------------------------------------------------------------------------
// Raw rows — loosely-typed CSV boundary, coerced exactly once
// ---------------------------------------------------------------------------

/// Raw quote row as it arrives from the CSV. Everything is an optional
/// string; all coercion and validation happens in [`normalize_row`] so a bad
/// cell drops one row instead of failing the load.
#[derive(Debug, Default, Deserialize)]
struct RawQuoteRow {
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    away_team: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    point: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    bookmaker: Option<String>,
    #[serde(default)]
    price: Option<String>,
}

/// Precomputed top-bets row. Accepts either a `Bet` or `key` id column.
#[derive(Debug, Default, Deserialize)]
struct TopBetRow {
    #[serde(rename = "Bet", default)]
    bet: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    max_price: Option<f64>,
    #[serde(default)]
    bookmaker: Option<String>,
    #[serde(default)]
    mean_price: Option<f64>,
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    sample_size: Option<f64>,
    #[serde(default)]
    above_threshold: Option<f64>,
    #[serde(default)]
    consensus_prob: Option<f64>,
    #[serde(default)]
    implied_prob: Option<f64>,
    #[serde(default)]
    prob_diff: Option<f64>,
}

#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    pub csv_total: usize,
    pub rejected_malformed: usize,
    pub rejected_missing_field: usize,
    pub rejected_bad_point: usize,
    pub rejected_bad_price: usize,
    pub rejected_label: usize,
    pub qualified: usize,
}

enum Rejection {
    MissingField,
    BadPoint,
    BadPrice,
    UnknownLabel,
}

// ---------------------------------------------------------------------------
// Fetch + parse
// ---------------------------------------------------------------------------

/// Read CSV text from a local path or an http(s) URL.
pub async fn fetch_csv_text(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        let resp = client.get(source).send().await?;
        if !resp.status().is_success() {
            return Err(AppError::Source(format!(
                "{} returned HTTP {}",
                source,
                resp.status()
            )));
        }
        Ok(resp.text().await?)
    } else {
        Ok(tokio::fs::read_to_string(source).await?)
    }
}

/// Load and normalize the raw quote set from a source.
pub async fn load_quotes(source: &str) -> Result<(Vec<Quote>, LoadStats)> {
    let text = fetch_csv_text(source).await?;
    Ok(parse_quotes(&text))
}

/// Load the optional precomputed top-bets table from a source.
pub async fn load_top_bets(source: &str) -> Result<Vec<ValueBetResult>> {
    let text = fetch_csv_text(source).await?;
    Ok(parse_top_bets(&text))
}

/// Parse raw quote CSV text into canonical quotes.
///
/// Malformed rows are counted and dropped, never fatal — they surface only
/// as a smaller effective sample downstream.
pub fn parse_quotes(text: &str) -> (Vec<Quote>, LoadStats) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut quotes = Vec::new();
    let mut stats = LoadStats::default();

    for record in reader.deserialize::<RawQuoteRow>() {
        stats.csv_total += 1;
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                stats.rejected_malformed += 1;
                debug!("dropping unreadable quote row: {e}");
                continue;
            }
        };
        match normalize_row(row) {
            Ok(quote) => quotes.push(quote),
            Err(Rejection::MissingField) => stats.rejected_missing_field += 1,
            Err(Rejection::BadPoint) => stats.rejected_bad_point += 1,
            Err(Rejection::BadPrice) => stats.rejected_bad_price += 1,
            Err(Rejection::UnknownLabel) => stats.rejected_label += 1,
        }
    }

    stats.qualified = quotes.len();
    (quotes, stats)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn normalize_row(row: RawQuoteRow) -> std::result::Result<Quote, Rejection> {
    let home = non_empty(row.home_team).ok_or(Rejection::MissingField)?;
    let away = non_empty(row.away_team).ok_or(Rejection::MissingField)?;
    let player = non_empty(row.description).ok_or(Rejection::MissingField)?;
    let market = non_empty(row.market).ok_or(Rejection::MissingField)?;
    let bookmaker = non_empty(row.bookmaker).ok_or(Rejection::MissingField)?;
    let label_raw = non_empty(row.label).ok_or(Rejection::MissingField)?;

    let label = OutcomeLabel::parse(&label_raw).ok_or(Rejection::UnknownLabel)?;

    let point = non_empty(row.point)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .ok_or(Rejection::BadPoint)?;

    // Non-numeric and non-positive prices are excluded from all statistics.
    let price = non_empty(row.price)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or(Rejection::BadPrice)?;

    Ok(Quote {
        game: format!("{home} vs {away}"),
        player,
        market,
        point,
        label,
        bookmaker,
        price,
    })
}

/// Parse precomputed top-bets CSV text. Rows missing the id or any numeric
/// field are skipped; the table's own ranking order is preserved.
pub fn parse_top_bets(text: &str) -> Vec<ValueBetResult> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut results = Vec::new();
    let mut skipped = 0usize;

    for record in reader.deserialize::<TopBetRow>() {
        let Ok(row) = record else {
            skipped += 1;
            continue;
        };
        match top_bet_from_row(row) {
            Some(result) => results.push(result),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("precomputed top-bets table: skipped {skipped} unusable rows");
    }
    results
}

fn top_bet_from_row(row: TopBetRow) -> Option<ValueBetResult> {
    let bet = non_empty(row.bet).or_else(|| non_empty(row.key))?;
    let max_price = row.max_price?;
    let mean_price = row.mean_price?;
    let threshold = row.threshold?;
    let sample_size = row.sample_size? as usize;
    let above_threshold = row.above_threshold?;
    let consensus_prob = row.consensus_prob?;
    let implied_prob = row.implied_prob?;
    let prob_diff = row.prob_diff?;
    let bookmaker = non_empty(row.bookmaker)?;

    Some(ValueBetResult {
        bet_display: format_bet_id_display(&bet),
        bet,
        max_price: round2(max_price),
        bookmaker,
        mean_price: round2(mean_price),
        threshold: round2(threshold),
        sample_size,
        above_threshold: round2(above_threshold),
        consensus_prob: round2(consensus_prob),
        implied_prob: round2(implied_prob),
        prob_diff: round2(prob_diff),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "home_team,away_team,description,market,label,point,bookmaker,price\n";

    #[test]
    fn valid_rows_become_quotes_with_derived_game() {
        let csv = format!(
            "{HEADER}Lakers,Celtics,LeBron James,player_points,Over,25.5,TAB,1.92\n"
        );
        let (quotes, stats) = parse_quotes(&csv);
        assert_eq!(quotes.len(), 1);
        let q = &quotes[0];
        assert_eq!(q.game, "Lakers vs Celtics");
        assert_eq!(q.label, OutcomeLabel::Over);
        assert!((q.price - 1.92).abs() < 1e-9);
        assert_eq!(stats.qualified, 1);
    }

    #[test]
    fn bad_prices_are_dropped_not_fatal() {
        let csv = format!(
            "{HEADER}\
             Lakers,Celtics,LeBron James,player_points,Over,25.5,TAB,not_a_number\n\
             Lakers,Celtics,LeBron James,player_points,Over,25.5,Betr,-2.0\n\
             Lakers,Celtics,LeBron James,player_points,Over,25.5,Unibet,0\n\
             Lakers,Celtics,LeBron James,player_points,Over,25.5,Sportsbet,1.9\n"
        );
        let (quotes, stats) = parse_quotes(&csv);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].bookmaker, "Sportsbet");
        assert_eq!(stats.rejected_bad_price, 3);
    }

    #[test]
    fn unknown_labels_are_excluded() {
        let csv = format!(
            "{HEADER}\
             Lakers,Celtics,LeBron James,player_points,Yes,25.5,TAB,1.9\n\
             Lakers,Celtics,LeBron James,player_points,UNDER,25.5,TAB,1.9\n"
        );
        let (quotes, stats) = parse_quotes(&csv);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].label, OutcomeLabel::Under);
        assert_eq!(stats.rejected_label, 1);
    }

    #[test]
    fn missing_required_fields_drop_the_row() {
        let csv = format!(
            "{HEADER},Celtics,LeBron James,player_points,Over,25.5,TAB,1.9\n"
        );
        let (quotes, stats) = parse_quotes(&csv);
        assert!(quotes.is_empty());
        assert_eq!(stats.rejected_missing_field, 1);
    }

    #[test]
    fn top_bets_accepts_bet_or_key_id_column() {
        let csv = "\
key,max_price,bookmaker,mean_price,threshold,sample_size,above_threshold,consensus_prob,implied_prob,prob_diff\n\
LeBron James_over_player_points_25.5,5.0,TAB,1.85,2.3,10,2.7,54.054,20.0,-34.054\n";
        let rows = parse_top_bets(csv);
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.bet, "LeBron James_over_player_points_25.5");
        assert_eq!(r.mean_price, 1.85);
        assert_eq!(r.prob_diff, -34.05);
        assert_eq!(r.sample_size, 10);
    }

    #[test]
    fn top_bets_rows_missing_numerics_are_skipped() {
        let csv = "\
Bet,max_price,bookmaker,mean_price,threshold,sample_size,above_threshold,consensus_prob,implied_prob,prob_diff\n\
A_over_player_points_10,,TAB,1.85,2.3,10,2.7,54.0,20.0,-34.0\n\
B_over_player_points_10,5.0,TAB,1.85,2.3,10,2.7,54.0,20.0,-34.0\n";
        let rows = parse_top_bets(csv);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].bet.starts_with("B_"));
    }
}
