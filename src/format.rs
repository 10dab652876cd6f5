//! Display formatting for points, markets, and bet labels.
//! Pure string helpers — consumed by API payload builders, never by the math.

use crate::types::{BetKey, OutcomeLabel};

/// Format a line value without a trailing `.0`: 25.0 → "25", 25.5 → "25.5".
pub fn format_point(point: f64) -> String {
    if !point.is_finite() {
        return point.to_string();
    }
    if (point - point.trunc()).abs() < 1e-9 {
        format!("{}", point.trunc() as i64)
    } else {
        let s = format!("{point}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Market code to human text: `player_points_alternate` → "Player Points Alternate".
pub fn format_market_display(market: &str) -> String {
    market
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-friendly bet text: "LeBron James | Points | OVER | 25.5".
/// Markets containing a known stat word collapse to the short category name.
pub fn format_bet_display(key: &BetKey) -> String {
    let market_lower = key.market.to_lowercase();
    let category = if market_lower.contains("points") {
        "Points".to_string()
    } else if market_lower.contains("rebounds") {
        "Rebounds".to_string()
    } else if market_lower.contains("assists") {
        "Assists".to_string()
    } else {
        format_market_display(&key.market)
    };

    let ou = match key.label {
        OutcomeLabel::Over => "OVER",
        OutcomeLabel::Under => "UNDER",
    };

    format!("{} | {} | {} | {}", key.player, category, ou, key.point)
}

/// Same display text, but recovered from a canonical underscore-joined bet id
/// ("player_label_market_point"). Used for precomputed table rows, where only
/// the id string survives. Ids with fewer than 4 segments pass through as-is.
pub fn format_bet_id_display(bet_id: &str) -> String {
    let parts: Vec<&str> = bet_id.split('_').collect();
    if parts.len() < 4 {
        return bet_id.to_string();
    }

    let player = parts[0];
    let label = parts[1];
    let market = if parts.len() > 4 {
        parts[2..parts.len() - 1].join("_")
    } else {
        parts[2].to_string()
    };
    let point = parts[parts.len() - 1];

    let market_lower = market.to_lowercase();
    let category = if market_lower.contains("points") {
        "Points".to_string()
    } else if market_lower.contains("rebounds") {
        "Rebounds".to_string()
    } else if market_lower.contains("assists") {
        "Assists".to_string()
    } else {
        format_market_display(&market)
    };

    format!("{} | {} | {} | {}", player, category, label.to_uppercase(), point)
}
