//! Lagrangian CLI: run the indicator pipeline and chart the result.
//!
//! Commands:
//! - `run`: fetch prices, compute indicators, write the buy-signal file, open the chart
//! - `init-config`: write a default TOML run config
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries the signal list.

mod chart;
mod theme;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use lagrangian_core::config::{ProviderKind, RunConfig};
use lagrangian_core::output::{
    write_indicator_csv, write_manifest, Presenter, SignalFile, SignalSink,
};
use lagrangian_core::{provider_for, run, RunReport};

use crate::chart::ChartView;
use crate::theme::Theme;

#[derive(Parser)]
#[command(
    name = "lagrangian",
    about = "Lagrangian price-energy indicator and buy-signal scanner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch prices, compute indicators and write buy signals.
    Run(RunArgs),
    /// Write a default TOML run config.
    InitConfig {
        /// Destination file.
        #[arg(default_value = "lagrangian.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Path to a TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker symbol (e.g., AAPL).
    #[arg(long)]
    symbol: Option<String>,

    /// Start date (YYYY-MM-DD). Defaults to one year before the end date.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Rolling window length in trading days.
    #[arg(long)]
    window: Option<usize>,

    /// Minimum defined samples before rolling stats are reported. Defaults to the window.
    #[arg(long)]
    min_periods: Option<usize>,

    #[arg(long, allow_negative_numbers = true)]
    lagrangian_threshold: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    velocity_threshold: Option<f64>,

    /// Signal file. Defaults to <SYMBOL>_buy_signals.txt.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Read prices from a CSV file instead of Yahoo Finance.
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Use a seeded synthetic random walk (offline).
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for --synthetic.
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the full indicator table as CSV.
    #[arg(long)]
    indicators_csv: Option<PathBuf>,

    /// Also write a JSON run manifest.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Skip the interactive chart.
    #[arg(long, default_value_t = false)]
    no_plot: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_cmd(args),
        Commands::InitConfig { path, force } => init_config(&path, force),
    }
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("--{flag} must be YYYY-MM-DD (got '{value}')"))
}

/// Layer CLI flags over the config file (or defaults) and validate the result.
fn build_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(symbol) = &args.symbol {
        config.symbol = symbol.trim().to_string();
    }
    if let Some(start) = &args.start {
        config.start_date = Some(parse_date("start", start)?);
    }
    if let Some(end) = &args.end {
        config.end_date = Some(parse_date("end", end)?);
    }
    if let Some(window) = args.window {
        config.window = window;
    }
    if args.min_periods.is_some() {
        config.min_periods = args.min_periods;
    }
    if let Some(lt) = args.lagrangian_threshold {
        config.lagrangian_threshold = lt;
    }
    if let Some(vt) = args.velocity_threshold {
        config.velocity_threshold = vt;
    }
    if args.output.is_some() {
        config.output_path = args.output.clone();
    }
    if let Some(csv) = &args.csv {
        config.provider.kind = ProviderKind::Csv;
        config.provider.csv_path = Some(csv.clone());
    }
    if args.synthetic {
        config.provider.kind = ProviderKind::Synthetic;
    }
    if let Some(seed) = args.seed {
        config.provider.seed = seed;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(report: &RunReport) {
    eprintln!();
    eprintln!("=== {} ({} to {}) ===", report.symbol, report.start, report.end);
    eprintln!("Source:           {:?}", report.source);
    eprintln!("Price points:     {}", report.points.len());
    eprintln!("Defined rows:     {}", report.summary.defined_rows);
    if let Some(mean) = report.summary.mean_lagrangian {
        eprintln!("Mean Lagrangian:  {mean:.8}");
    }
    if let Some(v) = report.summary.max_abs_velocity {
        eprintln!("Max |velocity|:   {v:.6}");
    }
    eprintln!("Signals:          {}", report.signals.len());
    eprintln!("Fingerprint:      {}", &report.fingerprint[..16]);
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let config = build_config(&args)?;

    let provider = provider_for(&config, today)?;
    let report = run(&config, provider.as_ref(), today)?;

    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }

    let signal_path = config.signal_file_path();
    SignalFile::stdout(&signal_path, &config.symbol)
        .emit(&report.signals)
        .with_context(|| format!("failed to write signals to {}", signal_path.display()))?;

    if let Some(path) = &args.indicators_csv {
        write_indicator_csv(path, &report.rows, &report.signals)?;
        eprintln!("Indicators saved to: {}", path.display());
    }
    if let Some(path) = &args.manifest {
        write_manifest(path, &report, &config)?;
        eprintln!("Manifest saved to: {}", path.display());
    }

    print_summary(&report);
    eprintln!("Signals saved to: {}", signal_path.display());

    if !args.no_plot && !report.rows.is_empty() {
        ChartView::new(Theme::parrot_neon()).render(&report.rows, &report.signals, &config)?;
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let toml = RunConfig::default().to_toml()?;
    std::fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["lagrangian", "run"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            Commands::InitConfig { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn defaults_without_flags() {
        let config = build_config(&RunArgs::default()).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--symbol",
            "MSFT",
            "--start",
            "2024-01-01",
            "--end",
            "2024-06-30",
            "--window",
            "10",
            "--lagrangian-threshold",
            "-0.05",
            "--velocity-threshold",
            "0.01",
            "--synthetic",
            "--seed",
            "9",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.symbol, "MSFT");
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(config.window, 10);
        assert_eq!(config.lagrangian_threshold, -0.05);
        assert_eq!(config.velocity_threshold, 0.01);
        assert_eq!(config.provider.kind, ProviderKind::Synthetic);
        assert_eq!(config.provider.seed, 9);
        assert_eq!(config.signal_file_path(), PathBuf::from("MSFT_buy_signals.txt"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "symbol = \"SPY\"\nwindow = 30\n").unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--window", "5"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.symbol, "SPY");
        assert_eq!(config.window, 5);
    }

    #[test]
    fn csv_and_synthetic_conflict() {
        assert!(Cli::try_parse_from(["lagrangian", "run", "--csv", "a.csv", "--synthetic"]).is_err());
    }

    #[test]
    fn bad_date_is_rejected() {
        let args = parse(&["--start", "01/02/2024"]);
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("--start"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let args = parse(&["--start", "2024-06-01", "--end", "2024-01-01"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn init_config_round_trips_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lagrangian.toml");
        init_config(&path, false).unwrap();

        let loaded = RunConfig::from_file(&path).unwrap();
        assert_eq!(loaded, RunConfig::default());
        assert!(init_config(&path, false).is_err());
        assert!(init_config(&path, true).is_ok());
    }

    #[test]
    fn synthetic_run_writes_signal_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("signals.txt");
        let csv = dir.path().join("rows.csv");
        let args = parse(&[
            "--synthetic",
            "--symbol",
            "TEST",
            "--start",
            "2024-01-01",
            "--end",
            "2024-12-31",
            "--output",
            output.to_str().unwrap(),
            "--indicators-csv",
            csv.to_str().unwrap(),
            "--no-plot",
        ]);
        run_cmd(args).unwrap();

        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.starts_with("--- Potential Buy Signals: TEST ---\n"));
        assert!(csv.exists());
    }
}
