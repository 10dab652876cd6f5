use crate::engine::round2;
use crate::types::StakeSolution;

/// Solve the two-sided stake split for a target gross return.
///
/// `target_payout` is the gross return desired from whichever side wins, so
/// each stake is simply `target / price`. Returns None for a non-positive
/// target or price — expected bad input, not an error.
///
/// Precondition: the pair should already satisfy the arbitrage condition
/// (`1/over + 1/under < 1`). The solver does not re-validate it; called on an
/// unmatched pair it will happily report a negative total_profit.
pub fn solve(price_over: f64, price_under: f64, target_payout: f64) -> Option<StakeSolution> {
    if !(target_payout.is_finite() && target_payout > 0.0) {
        return None;
    }
    if !(price_over.is_finite() && price_over > 0.0) {
        return None;
    }
    if !(price_under.is_finite() && price_under > 0.0) {
        return None;
    }

    let stake_over = target_payout / price_over;
    let stake_under = target_payout / price_under;
    let return_over = price_over * stake_over - stake_over;
    let return_under = price_under * stake_under - stake_under;
    // Profit if the under side wins, net of both stakes. Symmetric with the
    // over side because both gross returns equal target_payout.
    let total_profit = price_under * stake_under - (stake_over + stake_under);

    Some(StakeSolution {
        stake_over: round2(stake_over),
        stake_under: round2(stake_under),
        return_over: round2(return_over),
        return_under: round2(return_under),
        total_profit: round2(total_profit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_pair_solves_to_known_stakes() {
        let s = solve(2.10, 2.05, 100.0).expect("valid inputs");
        assert_eq!(s.stake_over, 47.62);
        assert_eq!(s.stake_under, 48.78);
        assert_eq!(s.return_over, 52.38);
        assert_eq!(s.return_under, 51.22);
        // 100 - (47.619 + 48.780) ≈ 3.60
        assert_eq!(s.total_profit, 3.6);
        assert!(s.total_profit > 0.0);
    }

    #[test]
    fn returns_satisfy_the_stake_price_identity() {
        // return_x == stake_x * (price_x - 1), checked pre-rounding.
        let (over, under, target) = (2.3, 2.2, 500.0);
        let s = solve(over, under, target).expect("valid inputs");
        let stake_over = target / over;
        let stake_under = target / under;
        assert!((s.return_over - round2(stake_over * (over - 1.0))).abs() < 1e-9);
        assert!((s.return_under - round2(stake_under * (under - 1.0))).abs() < 1e-9);
    }

    #[test]
    fn profit_is_positive_whenever_the_arb_condition_holds() {
        for (over, under) in [(2.10, 2.05), (2.5, 1.8), (3.0, 1.6), (2.02, 2.02)] {
            assert!(1.0 / over + 1.0 / under < 1.0, "test pair must be an arb");
            let s = solve(over, under, 250.0).expect("valid inputs");
            assert!(s.total_profit > 0.0, "over={over} under={under}");
            assert!(s.return_over > 0.0);
            assert!(s.return_under > 0.0);
        }
    }

    #[test]
    fn non_positive_target_is_rejected() {
        assert!(solve(2.1, 2.05, 0.0).is_none());
        assert!(solve(2.1, 2.05, -50.0).is_none());
    }

    #[test]
    fn non_positive_or_missing_prices_are_rejected() {
        assert!(solve(0.0, 2.05, 100.0).is_none());
        assert!(solve(2.1, -1.0, 100.0).is_none());
        assert!(solve(f64::NAN, 2.05, 100.0).is_none());
    }
}
