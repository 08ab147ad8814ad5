//! Output sinks: signal file, indicator CSV, run manifest, and the presenter seam
//! used by the chart front-end.

pub mod indicator_csv;
pub mod manifest;
pub mod signal_file;

pub use indicator_csv::{render_indicator_csv, write_indicator_csv};
pub use manifest::{write_manifest, RunManifest};
pub use signal_file::{header, render_signal_file, SignalFile, SignalSink};

use crate::config::RunConfig;
use crate::domain::{IndicatorRow, Signal};
use crate::error::Result;

/// Renders the computed series for a human. Undefined row values are skipped,
/// never drawn as zero.
pub trait Presenter {
    fn render(&mut self, rows: &[IndicatorRow], signals: &[Signal], config: &RunConfig)
        -> Result<()>;
}
