//! Synthetic price provider: seeded random walk over weekdays.
//!
//! Offline fallback for demos and tests. Same seed and range always produce
//! the same series.

use super::provider::{DataError, DataProvider, DataSource};
use crate::domain::PricePoint;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
    daily_drift: f64,
    daily_range: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
            daily_drift: 0.0003,
            daily_range: 0.03,
        }
    }
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        // Mix the symbol into the seed so different tickers diverge
        let symbol_salt = blake3::hash(symbol.as_bytes());
        let mut salt = [0u8; 8];
        salt.copy_from_slice(&symbol_salt.as_bytes()[..8]);
        let mut rng = StdRng::seed_from_u64(self.seed ^ u64::from_le_bytes(salt));

        let mut points = Vec::new();
        let mut close = self.start_price;

        for date in start.iter_days().take_while(|d| *d <= end) {
            if !is_weekday(date) {
                continue;
            }
            let ret = self.daily_drift + rng.gen_range(-self.daily_range..=self.daily_range);
            let open = close;
            close = (close * (1.0 + ret)).max(0.01);
            let wiggle = rng.gen_range(0.0..=self.daily_range / 2.0);
            points.push(PricePoint {
                timestamp: date,
                close,
                open: Some(open),
                high: Some(open.max(close) * (1.0 + wiggle)),
                low: Some(open.min(close) * (1.0 - wiggle)),
                volume: Some(rng.gen_range(500_000..5_000_000)),
            });
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    #[test]
    fn deterministic_for_seed() {
        let (start, end) = range();
        let a = SyntheticProvider::new(7).fetch("SPY", start, end).unwrap();
        let b = SyntheticProvider::new(7).fetch("SPY", start, end).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_symbols_diverge() {
        let (start, end) = range();
        let a = SyntheticProvider::new(7).fetch("SPY", start, end).unwrap();
        let b = SyntheticProvider::new(7).fetch("QQQ", start, end).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn skips_weekends_and_stays_ordered() {
        let (start, end) = range();
        let points = SyntheticProvider::new(1).fetch("SPY", start, end).unwrap();
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| is_weekday(p.timestamp)));
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(points.iter().all(|p| p.close > 0.0));
    }

    #[test]
    fn empty_when_range_inverted() {
        let (start, end) = range();
        let points = SyntheticProvider::new(1).fetch("SPY", end, start).unwrap();
        assert!(points.is_empty());
    }
}
