//! Pure input filters applied before aggregation. Restricting the quote set
//! happens here, never inside the engine's math.

use crate::config::{market_categories, LOCAL_BOOKMAKERS};
use crate::types::Quote;

/// Keep only quotes from the fixed local-bookmaker allow-list.
pub fn filter_local(quotes: &[Quote]) -> Vec<Quote> {
    quotes
        .iter()
        .filter(|q| LOCAL_BOOKMAKERS.contains(&q.bookmaker.as_str()))
        .cloned()
        .collect()
}

/// Market codes for a stat category key. None for unknown categories.
pub fn market_category_codes(category: &str) -> Option<&'static [&'static str]> {
    match category {
        "points" => Some(market_categories::POINTS),
        "rebounds" => Some(market_categories::REBOUNDS),
        "assists" => Some(market_categories::ASSISTS),
        _ => None,
    }
}

/// Keep only quotes whose market belongs to the given stat category.
/// Unknown categories match nothing.
pub fn filter_market_category(quotes: &[Quote], category: &str) -> Vec<Quote> {
    let Some(codes) = market_category_codes(category) else {
        return Vec::new();
    };
    quotes
        .iter()
        .filter(|q| codes.contains(&q.market.as_str()))
        .cloned()
        .collect()
}
