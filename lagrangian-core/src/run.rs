//! Run orchestration: fetch → validate → indicators → signals.
//!
//! Produces a `RunReport` and touches no files. Sinks consume the report
//! afterwards, so a failed run never leaves partial output behind.

use crate::config::{ProviderKind, RunConfig};
use crate::data::{
    validate_points, CsvProvider, DataProvider, DataSource, RetryPolicy, SyntheticProvider,
    YahooProvider,
};
use crate::domain::{IndicatorRow, PricePoint, Signal};
use crate::error::{Error, Result};
use crate::indicators::{compute_indicators, required_points, summarize, IndicatorSummary};
use crate::signals::detect_signals;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Non-fatal conditions recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// The provider returned no rows for the range.
    NoData,
    /// Fewer points than the warm-up needs; no row can be defined.
    InsufficientData { have: usize, need: usize },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::NoData => write!(f, "provider returned no data for the requested range"),
            RunWarning::InsufficientData { have, need } => write!(
                f,
                "insufficient data: {have} points, at least {need} needed for the warm-up window"
            ),
        }
    }
}

/// Everything a run produced, before any sink sees it.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source: DataSource,
    pub points: Vec<PricePoint>,
    pub rows: Vec<IndicatorRow>,
    pub signals: Vec<Signal>,
    pub warnings: Vec<RunWarning>,
    pub summary: IndicatorSummary,
    /// blake3 over the configuration and input closes.
    pub fingerprint: String,
}

/// Build the provider named by the configuration.
pub fn provider_for(config: &RunConfig, today: NaiveDate) -> Result<Box<dyn DataProvider>> {
    match config.provider.kind {
        ProviderKind::Yahoo => {
            let policy = RetryPolicy {
                max_retries: config.provider.max_retries,
                timeout: Duration::from_secs(config.provider.timeout_secs),
                ..RetryPolicy::default()
            };
            let provider = YahooProvider::new(policy).map_err(|source| {
                let (start, end) = config.date_range(today);
                Error::Provider {
                    symbol: config.symbol.clone(),
                    start,
                    end,
                    source,
                }
            })?;
            Ok(Box::new(provider))
        }
        ProviderKind::Csv => {
            let path = config.provider.csv_path.clone().ok_or_else(|| {
                Error::Config("provider.csv_path is required when provider.kind = \"csv\"".into())
            })?;
            Ok(Box::new(CsvProvider::new(path)))
        }
        ProviderKind::Synthetic => Ok(Box::new(SyntheticProvider::new(config.provider.seed))),
    }
}

/// Deterministic fingerprint of a run's inputs.
pub fn fingerprint(
    config: &RunConfig,
    start: NaiveDate,
    end: NaiveDate,
    points: &[PricePoint],
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(config).unwrap_or_default());
    hasher.update(start.to_string().as_bytes());
    hasher.update(end.to_string().as_bytes());
    for p in points {
        hasher.update(p.timestamp.to_string().as_bytes());
        hasher.update(&p.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Execute the pipeline. `today` fills a missing end date.
pub fn run(config: &RunConfig, provider: &dyn DataProvider, today: NaiveDate) -> Result<RunReport> {
    config.validate()?;
    let (start, end) = config.date_range(today);
    let symbol = config.symbol.as_str();

    info!(symbol, %start, %end, provider = provider.name(), "fetching price data");
    let points = provider
        .fetch(symbol, start, end)
        .map_err(|source| Error::Provider {
            symbol: symbol.to_string(),
            start,
            end,
            source,
        })?;
    info!(symbol, points = points.len(), "price data received");

    validate_points(symbol, &points)?;

    let indicator_config = config.indicator_config();
    let mut warnings = Vec::new();
    let need = required_points(&indicator_config);

    if points.is_empty() {
        warn!(symbol, %start, %end, "provider returned no data");
        warnings.push(RunWarning::NoData);
    } else if points.len() < need {
        warn!(symbol, have = points.len(), need, "insufficient data for warm-up window");
        warnings.push(RunWarning::InsufficientData {
            have: points.len(),
            need,
        });
    }

    let rows = compute_indicators(&points, &indicator_config);
    let summary = summarize(&rows);
    debug!(
        total = summary.total_rows,
        defined = summary.defined_rows,
        "indicators computed"
    );

    let signals = detect_signals(&rows, &config.signal_config());
    info!(symbol, signals = signals.len(), "signal detection complete");

    Ok(RunReport {
        symbol: symbol.to_string(),
        start,
        end,
        source: provider.source(),
        fingerprint: fingerprint(config, start, end, &points),
        points,
        rows,
        signals,
        warnings,
        summary,
    })
}
