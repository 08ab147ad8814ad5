//! Threshold signal detector.
//!
//! A row fires when `lagrangian > lagrangian_threshold` and the velocity clears
//! `velocity_threshold` (by magnitude, or upwards only under `VelocityRule::Rising`).
//! Both comparisons are strict. Evaluation is per row with no memory, except for
//! the optional `min_spacing_days` filter applied afterwards.

use crate::config::{SignalConfig, VelocityRule};
use crate::domain::{IndicatorRow, Signal};

/// Stateless per-row threshold rule.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdRule {
    config: SignalConfig,
}

impl ThresholdRule {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    fn velocity_passes(&self, velocity: f64) -> bool {
        match self.config.direction {
            VelocityRule::Absolute => velocity.abs() > self.config.velocity_threshold,
            VelocityRule::Rising => velocity > self.config.velocity_threshold,
        }
    }

    /// Evaluate one row. Rows with undefined values never fire.
    pub fn evaluate(&self, row: &IndicatorRow) -> Option<Signal> {
        let lagrangian = row.lagrangian?;
        let velocity = row.velocity?;

        if lagrangian > self.config.lagrangian_threshold && self.velocity_passes(velocity) {
            Some(Signal {
                timestamp: row.timestamp,
                close: row.close,
                lagrangian,
                velocity,
            })
        } else {
            None
        }
    }
}

/// Detect signals in chronological order.
pub fn detect_signals(rows: &[IndicatorRow], config: &SignalConfig) -> Vec<Signal> {
    let rule = ThresholdRule::new(*config);
    let spacing = i64::from(config.min_spacing_days);
    let mut signals: Vec<Signal> = Vec::new();

    for signal in rows.iter().filter_map(|row| rule.evaluate(row)) {
        if spacing > 0 {
            if let Some(last) = signals.last() {
                if (signal.timestamp - last.timestamp).num_days() <= spacing {
                    continue;
                }
            }
        }
        signals.push(signal);
    }

    signals
}
