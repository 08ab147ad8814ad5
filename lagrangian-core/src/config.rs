//! Run configuration.
//!
//! A `RunConfig` is loaded once (TOML file, CLI overrides, or defaults), validated,
//! and then split into the immutable `IndicatorConfig` and `SignalConfig` values
//! that the pipeline stages receive. Nothing downstream reads ambient state.
//!
//! ```toml
//! symbol = "AAPL"
//! start_date = "2024-01-01"
//! end_date = "2024-12-31"
//! window = 20
//! lagrangian_threshold = -0.01
//! velocity_threshold = 0.02
//! output_path = "AAPL_buy_signals.txt"
//!
//! [energy]
//! mass = 1.0
//! stiffness = 10.0
//! potential = "mean_deviation"
//!
//! [signal]
//! direction = "absolute"
//! min_spacing_days = 0
//!
//! [provider]
//! kind = "yahoo"
//! max_retries = 3
//! ```

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How potential energy is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PotentialModel {
    /// `stiffness * ((close - mean) / mean)^2`
    #[default]
    MeanDeviation,
    /// `stiffness * volatility`
    Volatility,
}

/// Constants of the energy analogy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Inertia term in `0.5 * mass * velocity^2`.
    pub mass: f64,
    /// Strength of the pull back towards the moving average.
    pub stiffness: f64,
    pub potential: PotentialModel,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            stiffness: 10.0,
            potential: PotentialModel::MeanDeviation,
        }
    }
}

/// Which velocity values pass the velocity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VelocityRule {
    /// `|velocity| > threshold`
    #[default]
    Absolute,
    /// `velocity > threshold` (up-moves only)
    Rising,
}

/// Signal options beyond the two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SignalOptions {
    pub direction: VelocityRule,
    /// Suppress signals within this many calendar days of the previous one.
    /// Zero keeps every qualifying day.
    pub min_spacing_days: u32,
}

/// Which data provider backs the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Required when `kind = "csv"`.
    pub csv_path: Option<PathBuf>,
    /// Seed for `kind = "synthetic"`.
    pub seed: u64,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            csv_path: None,
            seed: 42,
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

/// Full configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub symbol: String,
    /// Defaults to one year before `end_date`.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
    pub window: usize,
    /// Defaults to `window`.
    pub min_periods: Option<usize>,
    pub lagrangian_threshold: f64,
    pub velocity_threshold: f64,
    /// Defaults to `<SYMBOL>_buy_signals.txt`.
    pub output_path: Option<PathBuf>,
    pub energy: EnergyConfig,
    pub signal: SignalOptions,
    pub provider: ProviderConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".into(),
            start_date: None,
            end_date: None,
            window: 20,
            min_periods: None,
            lagrangian_threshold: -0.01,
            velocity_threshold: 0.02,
            output_path: None,
            energy: EnergyConfig::default(),
            signal: SignalOptions::default(),
            provider: ProviderConfig::default(),
        }
    }
}

/// Immutable input to the indicator pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorConfig {
    pub window: usize,
    pub min_periods: usize,
    pub energy: EnergyConfig,
}

impl IndicatorConfig {
    pub fn new(window: usize, min_periods: usize) -> Self {
        Self {
            window,
            min_periods,
            energy: EnergyConfig::default(),
        }
    }

    pub fn with_energy(mut self, energy: EnergyConfig) -> Self {
        self.energy = energy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::Config("window must be > 0".into()));
        }
        if self.min_periods == 0 || self.min_periods > self.window {
            return Err(Error::Config(format!(
                "min_periods must be in 1..={} (got {})",
                self.window, self.min_periods
            )));
        }
        if !(self.energy.mass.is_finite() && self.energy.mass > 0.0) {
            return Err(Error::Config(format!(
                "energy.mass must be a positive number (got {})",
                self.energy.mass
            )));
        }
        if !(self.energy.stiffness.is_finite() && self.energy.stiffness > 0.0) {
            return Err(Error::Config(format!(
                "energy.stiffness must be a positive number (got {})",
                self.energy.stiffness
            )));
        }
        Ok(())
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self::new(20, 20)
    }
}

/// Immutable input to the signal detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConfig {
    pub lagrangian_threshold: f64,
    pub velocity_threshold: f64,
    pub direction: VelocityRule,
    pub min_spacing_days: u32,
}

impl SignalConfig {
    pub fn new(lagrangian_threshold: f64, velocity_threshold: f64) -> Self {
        Self {
            lagrangian_threshold,
            velocity_threshold,
            direction: VelocityRule::Absolute,
            min_spacing_days: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lagrangian_threshold.is_finite() {
            return Err(Error::Config("lagrangian_threshold must be finite".into()));
        }
        if !self.velocity_threshold.is_finite() {
            return Err(Error::Config("velocity_threshold must be finite".into()));
        }
        Ok(())
    }
}

impl RunConfig {
    /// Load a run config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse a run config from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("parse config TOML: {e}")))
    }

    /// Serialize to TOML (used by `init-config`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(format!("serialize config: {e}")))
    }

    /// Resolve the inclusive date range, filling defaults relative to `today`.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or(today);
        let start = self
            .start_date
            .unwrap_or_else(|| end - chrono::Duration::days(365));
        (start, end)
    }

    pub fn signal_file_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}_buy_signals.txt", self.symbol)))
    }

    pub fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            window: self.window,
            min_periods: self.min_periods.unwrap_or(self.window),
            energy: self.energy,
        }
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            lagrangian_threshold: self.lagrangian_threshold,
            velocity_threshold: self.velocity_threshold,
            direction: self.signal.direction,
            min_spacing_days: self.signal.min_spacing_days,
        }
    }

    /// Check every field before any data is fetched.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Config("symbol must not be empty".into()));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::Config(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        if self.provider.kind == ProviderKind::Csv && self.provider.csv_path.is_none() {
            return Err(Error::Config(
                "provider.csv_path is required when provider.kind = \"csv\"".into(),
            ));
        }
        self.indicator_config().validate()?;
        self.signal_config().validate()
    }
}
