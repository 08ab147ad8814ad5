//! Top-level error type for a pipeline run.
//!
//! Provider, ordering and malformed-data errors abort the run before any output
//! is written. Insufficient history is not an error; see `RunWarning`.

use crate::data::DataError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fetch {symbol} ({start} to {end}): {source}")]
    Provider {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
        #[source]
        source: DataError,
    },

    #[error(
        "{symbol}: timestamps not strictly increasing at row {index} ({previous} followed by {current})"
    )]
    DataOrdering {
        symbol: String,
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("{symbol}: malformed price data at row {index}: {reason}")]
    MalformedData {
        symbol: String,
        index: usize,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chart rendering failed: {0}")]
    Render(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
