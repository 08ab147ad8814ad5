//! Signal list sink: console plus a flat text file.
//!
//! The file is truncated and rewritten on every run. Its content is built in
//! memory first and written in one call, so a failure mid-format cannot leave a
//! half-written list behind.

use crate::domain::Signal;
use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Consumer of the final signal list.
pub trait SignalSink {
    fn emit(&mut self, signals: &[Signal]) -> Result<()>;
}

/// Header line that opens every signal file.
pub fn header(symbol: &str) -> String {
    format!("--- Potential Buy Signals: {symbol} ---")
}

/// File body: header line, then one line per signal.
pub fn render_signal_file(symbol: &str, signals: &[Signal]) -> String {
    let mut out = header(symbol);
    out.push('\n');
    for signal in signals {
        out.push_str(&signal.to_string());
        out.push('\n');
    }
    out
}

/// Writes signals to `console` and to the file at `path`.
pub struct SignalFile<W: Write> {
    path: PathBuf,
    symbol: String,
    console: W,
}

impl SignalFile<std::io::Stdout> {
    pub fn stdout(path: impl Into<PathBuf>, symbol: impl Into<String>) -> Self {
        Self::new(path, symbol, std::io::stdout())
    }
}

impl<W: Write> SignalFile<W> {
    pub fn new(path: impl Into<PathBuf>, symbol: impl Into<String>, console: W) -> Self {
        Self {
            path: path.into(),
            symbol: symbol.into(),
            console,
        }
    }

    fn console_error(&self, source: std::io::Error) -> Error {
        Error::Output {
            path: PathBuf::from("<console>"),
            source,
        }
    }

    fn write_console(&mut self, signals: &[Signal]) -> std::io::Result<()> {
        writeln!(self.console, "{}", header(&self.symbol))?;
        if signals.is_empty() {
            writeln!(
                self.console,
                "No buy signals identified based on the current parameters."
            )?;
        }
        for signal in signals {
            writeln!(self.console, "{signal}")?;
        }
        self.console.flush()
    }
}

impl<W: Write> SignalSink for SignalFile<W> {
    fn emit(&mut self, signals: &[Signal]) -> Result<()> {
        self.write_console(signals)
            .map_err(|e| self.console_error(e))?;

        write_text_file(&self.path, &render_signal_file(&self.symbol, signals))?;
        info!(path = %self.path.display(), count = signals.len(), "signals written");
        Ok(())
    }
}

/// Truncate-then-write, creating parent directories as needed.
pub(crate) fn write_text_file(path: &Path, contents: &str) -> Result<()> {
    let to_output_err = |source| Error::Output {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_output_err)?;
    }
    std::fs::write(path, contents).map_err(to_output_err)
}
