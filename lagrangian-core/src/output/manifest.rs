//! Run manifest export (JSON).

use super::signal_file::write_text_file;
use crate::config::RunConfig;
use crate::data::DataSource;
use crate::domain::Signal;
use crate::error::Result;
use crate::indicators::IndicatorSummary;
use crate::run::{RunReport, RunWarning};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest<'a> {
    pub fingerprint: &'a str,
    pub generated_at: DateTime<Utc>,
    pub symbol: &'a str,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source: DataSource,
    pub points: usize,
    pub rows: usize,
    pub signal_count: usize,
    pub warnings: &'a [RunWarning],
    pub summary: &'a IndicatorSummary,
    pub signals: &'a [Signal],
    pub config: &'a RunConfig,
}

impl<'a> RunManifest<'a> {
    pub fn new(report: &'a RunReport, config: &'a RunConfig, generated_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint: &report.fingerprint,
            generated_at,
            symbol: &report.symbol,
            start: report.start,
            end: report.end,
            source: report.source,
            points: report.points.len(),
            rows: report.rows.len(),
            signal_count: report.signals.len(),
            warnings: &report.warnings,
            summary: &report.summary,
            signals: &report.signals,
            config,
        }
    }
}

pub fn write_manifest(path: &Path, report: &RunReport, config: &RunConfig) -> Result<()> {
    let manifest = RunManifest::new(report, config, Utc::now());
    let json = serde_json::to_string_pretty(&manifest)?;
    write_text_file(path, &json)
}
