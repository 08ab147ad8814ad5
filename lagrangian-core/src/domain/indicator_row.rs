//! IndicatorRow: derived indicator values for one PricePoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Indicator values for a single trading day.
///
/// Every field that depends on history is `None` until enough history exists.
/// Undefined values are never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: NaiveDate,
    pub close: f64,
    pub velocity: Option<f64>,
    pub rolling_mean: Option<f64>,
    pub volatility: Option<f64>,
    pub kinetic_energy: Option<f64>,
    pub potential_energy: Option<f64>,
    pub lagrangian: Option<f64>,
}

impl IndicatorRow {
    /// A row with every indicator undefined.
    pub fn undefined(timestamp: NaiveDate, close: f64) -> Self {
        Self {
            timestamp,
            close,
            velocity: None,
            rolling_mean: None,
            volatility: None,
            kinetic_energy: None,
            potential_energy: None,
            lagrangian: None,
        }
    }

    /// True when the row can take part in signal detection.
    pub fn is_defined(&self) -> bool {
        self.lagrangian.is_some() && self.velocity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_row_is_not_defined() {
        let row = IndicatorRow::undefined(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 100.0);
        assert!(!row.is_defined());
        assert_eq!(row.close, 100.0);
    }

    #[test]
    fn needs_both_velocity_and_lagrangian() {
        let mut row = IndicatorRow::undefined(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 100.0);
        row.lagrangian = Some(0.1);
        assert!(!row.is_defined());
        row.velocity = Some(0.02);
        assert!(row.is_defined());
    }
}
