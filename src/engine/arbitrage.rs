use crate::engine::{aggregate, round2};
use crate::format::{format_market_display, format_point};
use crate::types::{ArbitragePair, OutcomeLabel, Quote};

/// Enumerate every profitable over/under price combination.
///
/// Per line cohort this is the full over x under cross-product, not just the
/// best of each side — a bettor may be locked out of a particular bookmaker,
/// so every combination with `1/over + 1/under < 1.0` is surfaced. Results
/// sort descending by edge and are never capped.
pub fn find_pairs(quotes: &[Quote]) -> Vec<ArbitragePair> {
    let mut results = Vec::new();

    for (key, cohort) in aggregate::group_by_line(quotes) {
        let overs: Vec<&&Quote> = cohort.iter().filter(|q| q.label == OutcomeLabel::Over).collect();
        let unders: Vec<&&Quote> = cohort.iter().filter(|q| q.label == OutcomeLabel::Under).collect();
        if overs.is_empty() || unders.is_empty() {
            continue;
        }

        for over in &overs {
            if !(over.price.is_finite() && over.price > 0.0) {
                continue;
            }
            for under in &unders {
                if !(under.price.is_finite() && under.price > 0.0) {
                    continue;
                }

                let implied_total = 1.0 / over.price + 1.0 / under.price;
                if implied_total >= 1.0 {
                    continue;
                }
                let edge = 1.0 - implied_total;

                results.push(ArbitragePair {
                    game: key.game.clone(),
                    player: key.player.clone(),
                    market: key.market.clone(),
                    market_display: format_market_display(&key.market),
                    point: key.point.as_f64(),
                    point_display: format_point(key.point.as_f64()),
                    over_bookmaker: over.bookmaker.clone(),
                    over_price: round2(over.price),
                    under_bookmaker: under.bookmaker.clone(),
                    under_price: round2(under.price),
                    implied_total_pct: round2(implied_total * 100.0),
                    edge_pct: round2(edge * 100.0),
                });
            }
        }
    }

    results.sort_by(|a, b| {
        b.edge_pct
            .total_cmp(&a.edge_pct)
            .then_with(|| a.game.cmp(&b.game))
            .then_with(|| a.player.cmp(&b.player))
            .then_with(|| a.over_bookmaker.cmp(&b.over_bookmaker))
            .then_with(|| a.under_bookmaker.cmp(&b.under_bookmaker))
    });
    results
}
