//! Indicator derivation: velocity, rolling statistics, energy terms, Lagrangian.
//!
//! Indicators are computed once over the full price series, before signal
//! detection. No value at row t depends on data after row t.

pub mod energy;
pub mod pipeline;
pub mod rolling;

pub use pipeline::{compute_indicators, required_points, summarize, IndicatorSummary};
pub use rolling::RollingWindow;

/// Create price points from close prices on consecutive days, for testing.
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<crate::domain::PricePoint> {
    use crate::domain::PricePoint;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            PricePoint::from_close(base_date + chrono::Duration::days(i as i64), close)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
