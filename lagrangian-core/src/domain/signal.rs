//! Signal: a day flagged by the threshold rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A flagged buy candidate. Produced once, never revised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: NaiveDate,
    pub close: f64,
    pub lagrangian: f64,
    pub velocity: f64,
}

impl fmt::Display for Signal {
    /// `<date>, close=<price>, lagrangian=<value>, velocity=<value>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, close={:.4}, lagrangian={:.8}, velocity={:.6}",
            self.timestamp.format("%Y-%m-%d"),
            self.close,
            self.lagrangian,
            self.velocity
        )
    }
}
