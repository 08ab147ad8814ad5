//! Input validation run before any indicator is computed.
//!
//! Rejects out-of-order or duplicate timestamps and non-finite closes. Gaps
//! between trading days are allowed and left as-is.

use crate::domain::PricePoint;
use crate::error::{Error, Result};

/// Check ordering and close values. Empty input is valid.
pub fn validate_points(symbol: &str, points: &[PricePoint]) -> Result<()> {
    for (index, point) in points.iter().enumerate() {
        if !point.has_finite_close() {
            return Err(Error::MalformedData {
                symbol: symbol.to_string(),
                index,
                reason: format!("close is {} on {}", point.close, point.timestamp),
            });
        }
        if index > 0 {
            let previous = points[index - 1].timestamp;
            if point.timestamp <= previous {
                return Err(Error::DataOrdering {
                    symbol: symbol.to_string(),
                    index,
                    previous,
                    current: point.timestamp,
                });
            }
        }
    }
    Ok(())
}
