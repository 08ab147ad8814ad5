//! Domain types: price observations, derived indicator rows, flagged signals.

pub mod indicator_row;
pub mod price_point;
pub mod signal;

pub use indicator_row::IndicatorRow;
pub use price_point::PricePoint;
pub use signal::Signal;
