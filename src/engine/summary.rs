use std::collections::BTreeMap;

use crate::engine::{mean_and_sample_std, round2};
use crate::types::{HistogramBucket, PriceSummary};

/// Integer histogram bucket: price in hundredths, same trick as [`PointKey`].
///
/// [`PointKey`]: crate::types::PointKey
fn bucket_key(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// Describe a price set: count, mean, sample std, min, max, and a frequency
/// histogram bucketed by price rounded to 2 decimals. Drives distribution
/// views, never the detection math.
///
/// Non-finite and non-positive prices are excluded; empty or all-invalid
/// input yields count = 0 with null statistics and an empty histogram.
pub fn summarize(prices: &[f64]) -> PriceSummary {
    let valid: Vec<f64> = prices
        .iter()
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .collect();
    if valid.is_empty() {
        return PriceSummary::empty();
    }

    let (mean, std) = mean_and_sample_std(&valid);
    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut counts: BTreeMap<i64, u32> = BTreeMap::new();
    for price in &valid {
        *counts.entry(bucket_key(*price)).or_insert(0) += 1;
    }
    let histogram = counts
        .into_iter()
        .map(|(key, count)| HistogramBucket {
            price: key as f64 / 100.0,
            count,
        })
        .collect();

    PriceSummary {
        count: valid.len(),
        mean: Some(round2(mean)),
        std: Some(round2(std)),
        min: Some(round2(min)),
        max: Some(round2(max)),
        histogram,
    }
}
