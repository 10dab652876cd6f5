use std::collections::BTreeMap;

use crate::types::{BetKey, LineKey, Quote};

/// Group quotes by specific bet (player, label, market, point) — the cohort
/// every bookmaker quoting the same bet falls into for consensus statistics.
///
/// BTreeMap keys give a deterministic cohort iteration order; within each
/// group, input order is preserved.
pub fn group_by_bet(quotes: &[Quote]) -> BTreeMap<BetKey, Vec<&Quote>> {
    let mut groups: BTreeMap<BetKey, Vec<&Quote>> = BTreeMap::new();
    for quote in quotes {
        groups.entry(quote.bet_key()).or_default().push(quote);
    }
    groups
}

/// Group quotes by line (game, player, market, point), label-agnostic, so
/// over and under quotes for the same line can be paired for arbitrage.
pub fn group_by_line(quotes: &[Quote]) -> BTreeMap<LineKey, Vec<&Quote>> {
    let mut groups: BTreeMap<LineKey, Vec<&Quote>> = BTreeMap::new();
    for quote in quotes {
        groups.entry(quote.line_key()).or_default().push(quote);
    }
    groups
}
