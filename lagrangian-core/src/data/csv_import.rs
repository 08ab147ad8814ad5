//! CSV import provider.
//!
//! Reads a daily price table exported from any charting tool or a previous
//! Yahoo download. Required columns: a date column (`date`, `timestamp` or
//! `time`, matched case-insensitively) and `close`. `open`, `high`, `low` and
//! `volume` are picked up when present.

use super::provider::{DataError, DataProvider, DataSource};
use crate::domain::PricePoint;
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::debug;

const DATE_COLUMNS: [&str; 3] = ["date", "timestamp", "time"];

/// Provider reading a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_frame(&self) -> Result<DataFrame, DataError> {
        if !self.path.exists() {
            return Err(DataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", self.path.display()),
            )));
        }

        LazyCsvReader::new(&self.path)
            .with_has_header(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| DataError::Csv(e.to_string()))
    }
}

/// Find a column by case-insensitive name.
fn find_column<'a>(df: &'a DataFrame, names: &[&str]) -> Option<&'a Column> {
    df.get_columns().iter().find(|c| {
        names
            .iter()
            .any(|n| c.name().as_str().eq_ignore_ascii_case(n))
    })
}

fn float_column(df: &DataFrame, name: &str) -> Result<Option<Float64Chunked>, DataError> {
    find_column(df, &[name])
        .map(|c| {
            c.cast(&DataType::Float64)
                .and_then(|c| c.f64().cloned())
                .map_err(|e| DataError::Csv(format!("column '{name}': {e}")))
        })
        .transpose()
}

/// Parse `YYYY-MM-DD`, tolerating a trailing time component.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Convert a loaded frame into price points, in file order.
pub fn frame_to_points(df: &DataFrame) -> Result<Vec<PricePoint>, DataError> {
    let dates = find_column(df, &DATE_COLUMNS)
        .ok_or_else(|| DataError::Csv("missing date column".into()))?
        .cast(&DataType::String)
        .map_err(|e| DataError::Csv(format!("date column: {e}")))?;
    let dates = dates
        .str()
        .map_err(|e| DataError::Csv(format!("date column: {e}")))?;

    let closes =
        float_column(df, "close")?.ok_or_else(|| DataError::Csv("missing close column".into()))?;
    let opens = float_column(df, "open")?;
    let highs = float_column(df, "high")?;
    let lows = float_column(df, "low")?;
    let volumes = float_column(df, "volume")?;

    let mut points = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    for i in 0..df.height() {
        let raw_date = dates
            .get(i)
            .ok_or_else(|| DataError::Csv(format!("row {}: missing date", i + 1)))?;
        let timestamp = parse_date(raw_date)
            .ok_or_else(|| DataError::Csv(format!("row {}: invalid date '{raw_date}'", i + 1)))?;

        let Some(close) = closes.get(i) else {
            skipped += 1;
            continue;
        };

        points.push(PricePoint {
            timestamp,
            close,
            open: opens.as_ref().and_then(|c| c.get(i)),
            high: highs.as_ref().and_then(|c| c.get(i)),
            low: lows.as_ref().and_then(|c| c.get(i)),
            volume: volumes
                .as_ref()
                .and_then(|c| c.get(i))
                .filter(|v| *v >= 0.0)
                .map(|v| v.round() as u64),
        });
    }

    if skipped > 0 {
        debug!(skipped, "dropped CSV rows without a close price");
    }

    Ok(points)
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch(
        &self,
        _symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let df = self.read_frame()?;
        let points = frame_to_points(&df)?;
        Ok(points
            .into_iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .collect())
    }
}
