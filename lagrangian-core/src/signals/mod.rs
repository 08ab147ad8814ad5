//! Signal detection over computed indicator rows.

pub mod detector;

pub use detector::{detect_signals, ThresholdRule};
