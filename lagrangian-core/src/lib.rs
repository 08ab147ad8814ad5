//! Lagrangian Core: price data, indicator pipeline, signal detection, output sinks.
//!
//! A run is a straight line:
//! - fetch daily closes from a `DataProvider` (Yahoo Finance, CSV, synthetic)
//! - validate ordering and finiteness
//! - derive velocity, rolling mean, volatility, kinetic and potential energy, and
//!   their difference (the "Lagrangian")
//! - flag days where the Lagrangian and the velocity both clear their thresholds
//! - hand the result to sinks (signal file, indicator CSV, manifest, chart)

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod output;
pub mod run;
pub mod signals;

pub use config::{IndicatorConfig, RunConfig, SignalConfig};
pub use domain::{IndicatorRow, PricePoint, Signal};
pub use error::{Error, Result};
pub use run::{provider_for, run, RunReport, RunWarning};
