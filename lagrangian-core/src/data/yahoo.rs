//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API with a bounded retry
//! policy (exponential backoff) for transient failures.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV import path is the fallback when Yahoo is unavailable.

use super::provider::{DataError, DataProvider, DataSource};
use crate::domain::PricePoint;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Bounded retry policy for network fetches.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given attempt (attempt 0 has no delay).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            self.base_delay * 2u32.saturating_pow(attempt - 1)
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    policy: RetryPolicy,
}

impl YahooProvider {
    pub fn new(policy: RetryPolicy) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(policy.timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, policy })
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp()
            + 86_399;
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Parse the chart API response into price points.
    ///
    /// A result without timestamps is an empty range, not an error.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<PricePoint>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
        let mut skipped = 0usize;
        let mut merged = 0usize;

        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Rows without a close (holidays, halted sessions) carry nothing usable
            let Some(close) = quote.close.get(i).copied().flatten() else {
                skipped += 1;
                continue;
            };

            let point = PricePoint {
                timestamp,
                close,
                open: quote.open.get(i).copied().flatten(),
                high: quote.high.get(i).copied().flatten(),
                low: quote.low.get(i).copied().flatten(),
                volume: quote.volume.get(i).copied().flatten(),
            };

            // A live-session quote shares the date of that day's bar; the later row wins
            match points.last_mut() {
                Some(last) if last.timestamp == timestamp => {
                    *last = point;
                    merged += 1;
                }
                _ => points.push(point),
            }
        }

        if skipped > 0 {
            debug!(symbol, skipped, "dropped rows without a close price");
        }
        if merged > 0 {
            debug!(symbol, merged, "collapsed rows sharing a calendar date");
        }

        Ok(points)
    }

    /// Execute a single request, classifying the HTTP outcome.
    fn fetch_once(&self, symbol: &str, url: &str) -> Result<Vec<PricePoint>, DataError> {
        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DataError::NetworkUnreachable(e.to_string())
            } else {
                DataError::Other(e.to_string())
            }
        })?;

        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            // Yahoo answers unknown tickers with 404 and an error body
            if let Ok(chart) = resp.json::<ChartResponse>() {
                return Self::parse_response(symbol, chart);
            }
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        with_retry(&self.policy, symbol, || self.fetch_once(symbol, &url))
    }
}

/// Run `op` under `policy`. Only transient errors are retried, at most
/// `max_retries` times after the first attempt.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    symbol: &str,
    mut op: impl FnMut() -> Result<T, DataError>,
) -> Result<T, DataError> {
    let mut attempt = 0;

    loop {
        std::thread::sleep(policy.delay_for(attempt));

        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                warn!(symbol, attempt, error = %e, "transient fetch failure, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        self.fetch_with_retry(symbol, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<PricePoint>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("AAPL", resp)
    }

    #[test]
    fn parses_quote_rows() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200],
            "indicators":{"quote":[{
                "open":[187.15,184.22],"high":[188.44,185.88],
                "low":[183.89,183.43],"close":[185.64,184.25],
                "volume":[82488700,58414500]}]}
        }],"error":null}}"#;
        let points = parse(json).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(points[0].close, 185.64);
        assert_eq!(points[1].volume, Some(58414500));
    }

    #[test]
    fn skips_rows_without_close() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200],
            "indicators":{"quote":[{"close":[null,184.25]}]}
        }],"error":null}}"#;
        let points = parse(json).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, 184.25);
        assert!(points[0].open.is_none());
    }

    #[test]
    fn missing_timestamps_is_empty_range() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn same_day_rows_collapse_to_latest() {
        // 1704378600 and 1704391500 are both 2024-01-04 UTC
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704292200,1704378600,1704391500],
            "indicators":{"quote":[{"close":[184.25,181.91,182.40]}]}
        }],"error":null}}"#;
        let points = parse(json).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].timestamp, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(points[1].close, 182.40);
        assert!(crate::data::validate_points("AAPL", &points).is_ok());
    }

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn retry_stops_after_max_retries() {
        let mut calls = 0;
        let result: Result<(), DataError> = with_retry(&instant_policy(3), "AAPL", || {
            calls += 1;
            Err(DataError::Http { status: 503 })
        });
        assert!(matches!(result, Err(DataError::Http { status: 503 })));
        assert_eq!(calls, 4);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), DataError> = with_retry(&instant_policy(3), "NOPE", || {
            calls += 1;
            Err(DataError::SymbolNotFound {
                symbol: "NOPE".into(),
            })
        });
        assert!(matches!(result, Err(DataError::SymbolNotFound { .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn transient_failure_then_success() {
        let mut calls = 0;
        let result = with_retry(&instant_policy(3), "AAPL", || {
            calls += 1;
            if calls < 3 {
                Err(DataError::NetworkUnreachable("timeout".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let mut calls = 0;
        let result: Result<(), DataError> = with_retry(&instant_policy(0), "AAPL", || {
            calls += 1;
            Err(DataError::RateLimited { retry_after_secs: 1 })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn unknown_error_maps_to_format_changed() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn chart_url_covers_whole_end_day() {
        let url = YahooProvider::chart_url(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704153599"));
    }

    #[test]
    fn retry_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }
}
