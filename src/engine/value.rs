use crate::config::{MIN_COHORT_SIZE, TOP_BETS_LIMIT};
use crate::engine::{aggregate, mean_and_sample_std, round2};
use crate::format::format_bet_display;
use crate::types::{BetKey, Quote, ValueBetResult};

/// Apply the value-bet rule to one cohort.
///
/// Returns None for thin cohorts (< MIN_COHORT_SIZE valid prices) and for
/// cohorts whose max price sits at or below mean + 1 sample std — neither is
/// an error, there is simply nothing interesting there. The comparison is
/// strict: a cohort of identical prices has max == threshold and never fires.
pub fn analyze_cohort(key: &BetKey, quotes: &[&Quote]) -> Option<ValueBetResult> {
    let prices: Vec<f64> = quotes
        .iter()
        .map(|q| q.price)
        .filter(|p| p.is_finite() && *p > 0.0)
        .collect();
    if prices.len() < MIN_COHORT_SIZE {
        return None;
    }

    let (mean, std) = mean_and_sample_std(&prices);
    let threshold = mean + std;

    // Max price and its owner. Ties break to the lexicographically smallest
    // bookmaker name — input ordering is not guaranteed across data sources.
    let mut best: Option<&Quote> = None;
    for quote in quotes {
        if !(quote.price.is_finite() && quote.price > 0.0) {
            continue;
        }
        best = match best {
            None => Some(quote),
            Some(b) if quote.price > b.price => Some(quote),
            Some(b) if quote.price == b.price && quote.bookmaker < b.bookmaker => Some(quote),
            Some(b) => Some(b),
        };
    }
    let best = best?;

    if best.price <= threshold {
        return None;
    }

    let consensus_prob = 100.0 / mean;
    let implied_prob = 100.0 / best.price;

    Some(ValueBetResult {
        bet: key.canonical(),
        bet_display: format_bet_display(key),
        max_price: best.price,
        bookmaker: best.bookmaker.clone(),
        mean_price: mean,
        threshold,
        sample_size: prices.len(),
        above_threshold: best.price - threshold,
        consensus_prob,
        implied_prob,
        prob_diff: implied_prob - consensus_prob,
    })
}

/// Full value-bet pipeline: group, analyze, rank, truncate, round.
///
/// Ranking is ascending by prob_diff (more negative = the max price implies a
/// lower win probability than the pack's consensus — the bookmaker is pricing
/// more generously), tie-broken descending by consensus_prob, then by bet id
/// so repeated runs are bit-identical. Capped at TOP_BETS_LIMIT rows.
pub fn top_value_bets(quotes: &[Quote]) -> Vec<ValueBetResult> {
    let mut results: Vec<ValueBetResult> = aggregate::group_by_bet(quotes)
        .iter()
        .filter_map(|(key, cohort)| analyze_cohort(key, cohort))
        .collect();

    results.sort_by(|a, b| {
        a.prob_diff
            .total_cmp(&b.prob_diff)
            .then_with(|| b.consensus_prob.total_cmp(&a.consensus_prob))
            .then_with(|| a.bet.cmp(&b.bet))
    });
    results.truncate(TOP_BETS_LIMIT);

    for r in &mut results {
        r.max_price = round2(r.max_price);
        r.mean_price = round2(r.mean_price);
        r.threshold = round2(r.threshold);
        r.above_threshold = round2(r.above_threshold);
        r.consensus_prob = round2(r.consensus_prob);
        r.implied_prob = round2(r.implied_prob);
        r.prob_diff = round2(r.prob_diff);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutcomeLabel;

    fn quote(player: &str, bookmaker: &str, price: f64) -> Quote {
        Quote {
            game: "Lakers vs Celtics".to_string(),
            player: player.to_string(),
            market: "player_points".to_string(),
            point: 25.5,
            label: OutcomeLabel::Over,
            bookmaker: bookmaker.to_string(),
            price,
        }
    }

    /// One cohort of `prices` for `player`, bookmakers named book0, book1, ...
    fn cohort(player: &str, prices: &[f64]) -> Vec<Quote> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| quote(player, &format!("book{i}"), p))
            .collect()
    }

    #[test]
    fn cohorts_below_the_size_floor_yield_nothing() {
        for n in [0usize, 1, 9] {
            let quotes = cohort("A", &vec![1.5; n]);
            assert!(top_value_bets(&quotes).is_empty(), "n={n} should not qualify");
        }
    }

    #[test]
    fn ten_identical_prices_sit_on_the_threshold_and_are_excluded() {
        // std = 0 so threshold == mean == price; max <= threshold requires
        // strictly greater to fire.
        let quotes = cohort("A", &[1.5; 10]);
        assert!(top_value_bets(&quotes).is_empty());
    }

    #[test]
    fn single_outlier_in_ten_is_flagged_with_negative_prob_diff() {
        let mut prices = vec![1.5; 9];
        prices.push(5.0);
        let quotes = cohort("A", &prices);

        let results = top_value_bets(&quotes);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.bookmaker, "book9");
        assert_eq!(r.max_price, 5.0);
        assert_eq!(r.sample_size, 10);
        // mean = 1.85, implied = 100/5 = 20, consensus = 100/1.85 ≈ 54.05
        assert_eq!(r.mean_price, 1.85);
        assert_eq!(r.implied_prob, 20.0);
        assert!(r.prob_diff < 0.0, "prob_diff={}", r.prob_diff);
        assert_eq!(r.prob_diff, round2(20.0 - 100.0 / 1.85));
    }

    #[test]
    fn max_price_ties_break_to_smallest_bookmaker_name() {
        let mut quotes = cohort("A", &[1.5; 9]);
        quotes.push(quote("A", "Zeta", 5.0));
        quotes.push(quote("A", "Alpha", 5.0));

        let results = top_value_bets(&quotes);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].bookmaker, "Alpha");

        // Same quotes, reversed input order — same winner.
        quotes.reverse();
        let results = top_value_bets(&quotes);
        assert_eq!(results[0].bookmaker, "Alpha");
    }

    #[test]
    fn results_are_capped_at_fifty() {
        // 60 qualifying cohorts, one per player.
        let mut quotes = Vec::new();
        for i in 0..60 {
            let player = format!("player{i:02}");
            quotes.extend(cohort(&player, &[1.5; 9]));
            // Vary the outlier so prob_diffs differ across cohorts.
            quotes.push(quote(&player, "book9", 4.0 + i as f64 * 0.01));
        }
        let results = top_value_bets(&quotes);
        assert_eq!(results.len(), 50);
    }

    #[test]
    fn ranking_is_ascending_by_prob_diff() {
        let mut quotes = Vec::new();
        // Bigger outlier price → lower implied prob → more negative prob_diff.
        quotes.extend(cohort("mild", &[1.5; 9]));
        quotes.push(quote("mild", "book9", 3.0));
        quotes.extend(cohort("strong", &[1.5; 9]));
        quotes.push(quote("strong", "book9", 6.0));

        let results = top_value_bets(&quotes);
        assert_eq!(results.len(), 2);
        assert!(results[0].bet.starts_with("strong"));
        assert!(results[0].prob_diff <= results[1].prob_diff);
    }

    #[test]
    fn detector_output_is_identical_across_runs() {
        let mut quotes = Vec::new();
        for i in 0..20 {
            let player = format!("p{i}");
            quotes.extend(cohort(&player, &[1.4, 1.5, 1.6, 1.5, 1.45, 1.55, 1.5, 1.5, 1.5]));
            quotes.push(quote(&player, "book9", 2.5 + (i % 7) as f64 * 0.1));
        }
        let first = top_value_bets(&quotes);
        let second = top_value_bets(&quotes);
        assert_eq!(first, second);
    }

    #[test]
    fn non_positive_prices_shrink_the_effective_sample() {
        // 10 rows but one invalid price — effective sample of 9, excluded.
        let mut quotes = cohort("A", &[1.5; 9]);
        quotes.push(quote("A", "book9", 0.0));
        assert!(top_value_bets(&quotes).is_empty());
    }
}
