//! PricePoint: one daily observation from a data provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily price observation for a single symbol.
///
/// Only `close` drives the indicator pipeline. The remaining OHLCV columns are
/// carried through for export and charting when the provider supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDate,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<u64>,
}

impl PricePoint {
    /// A point carrying only a close price.
    pub fn from_close(timestamp: NaiveDate, close: f64) -> Self {
        Self {
            timestamp,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }

    /// Returns true if the close is a usable number.
    pub fn has_finite_close(&self) -> bool {
        self.close.is_finite()
    }
}
