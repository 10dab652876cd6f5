//! The analytical core: cohort grouping, consensus statistics, outlier
//! detection, arbitrage matching, and stake solving. Every function here is
//! a pure, synchronous pass over an in-memory quote set — loading data and
//! serving results live elsewhere.

pub mod aggregate;
pub mod arbitrage;
pub mod stake;
pub mod summary;
pub mod value;

/// Round to 2 decimal places for external use. Computation always happens at
/// full precision first; rounding is the last step before a value leaves the
/// engine.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Sample mean and sample standard deviation (n - 1 divisor).
/// std is 0.0 when n == 1 — no undefined division.
pub(crate) fn mean_and_sample_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };
    (mean, std)
}
