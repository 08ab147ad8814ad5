//! Indicator table export as CSV.
//!
//! Columns: date, close, velocity, rolling_mean, volatility, kinetic_energy,
//! potential_energy, lagrangian, signal. Undefined values are empty cells.

use super::signal_file::write_text_file;
use crate::domain::{IndicatorRow, Signal};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.10}")).unwrap_or_default()
}

/// Render rows to CSV text, flagging the dates that produced a signal.
pub fn render_indicator_csv(rows: &[IndicatorRow], signals: &[Signal]) -> Result<String> {
    let flagged: HashSet<_> = signals.iter().map(|s| s.timestamp).collect();
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "close",
        "velocity",
        "rolling_mean",
        "volatility",
        "kinetic_energy",
        "potential_energy",
        "lagrangian",
        "signal",
    ])?;

    for row in rows {
        wtr.write_record([
            row.timestamp.format("%Y-%m-%d").to_string(),
            format!("{:.6}", row.close),
            cell(row.velocity),
            cell(row.rolling_mean),
            cell(row.volatility),
            cell(row.kinetic_energy),
            cell(row.potential_energy),
            cell(row.lagrangian),
            if flagged.contains(&row.timestamp) { "1" } else { "0" }.to_string(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| Error::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write the indicator table to `path` (truncating).
pub fn write_indicator_csv(path: &Path, rows: &[IndicatorRow], signals: &[Signal]) -> Result<()> {
    write_text_file(path, &render_indicator_csv(rows, signals)?)
}
