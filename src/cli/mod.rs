//! Command-line parsing for the funding-stress monitor.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! scoring code. Every tunable resolves as flag -> environment (`.env` is
//! loaded first) -> default.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::nyfed::DEFAULT_BASE_URL;
use crate::domain::{
    DEFAULT_LOOKBACK_DAYS, DEFAULT_REPO_KEY, DEFAULT_SECURED_KEY, DEFAULT_UNSECURED_KEY, RepoSignal,
};
use crate::score::DEFAULT_TAIL_K;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fstress", version, about = "Funding-market liquidity stress monitor (NY Fed data)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, score, and print the summary, recent readings, and a plot.
    Score(ScoreArgs),
    /// Print only the headline reading (useful for scripting).
    Latest(ScoreArgs),
    /// Plot a previously exported score JSON.
    Plot(PlotArgs),
    /// Launch the interactive dashboard.
    ///
    /// This uses the same refresh pipeline as `fstress score`, but renders
    /// gauges, charts, and a table in a terminal UI using Ratatui.
    Tui(ScoreArgs),
}

/// Where series come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// NY Fed Markets API base URL.
    #[arg(long, env = "NYFED_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Read `<SERIES_ID>.csv` files from this directory instead of the API.
    #[arg(long, env = "STRESS_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Use seeded synthetic series (no network).
    #[arg(long, conflicts_with = "data_dir")]
    pub demo: bool,

    /// Seed for `--demo`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Common options for scoring.
#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Tail sensitivity k: |z| must exceed this to score above 50%.
    #[arg(short = 'k', long = "tail-k", env = "STRESS_TAIL_K", default_value_t = DEFAULT_TAIL_K)]
    pub tail_k: f64,

    /// Lookback window in days (30..=5000).
    #[arg(short = 'l', long, env = "STRESS_LOOKBACK_DAYS", default_value_t = DEFAULT_LOOKBACK_DAYS)]
    pub lookback: u32,

    /// Score the window ending on this date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    pub asof: Option<NaiveDate>,

    /// Secured overnight rate (reference rate type).
    #[arg(long, default_value = DEFAULT_SECURED_KEY)]
    pub secured: String,

    /// Unsecured overnight rate (reference rate type).
    #[arg(long, default_value = DEFAULT_UNSECURED_KEY)]
    pub unsecured: String,

    /// Repo operation aggregate: REPO_TOTAL, RRP_TOTAL, or ALL.
    #[arg(long, env = "STRESS_REPO_KEY", default_value = DEFAULT_REPO_KEY)]
    pub repo_key: String,

    /// Score the spread alone.
    #[arg(long)]
    pub no_repo: bool,

    /// Which repo feature drives the repo probability.
    #[arg(long, value_enum, default_value_t = RepoSignal::LogChange5)]
    pub repo_signal: RepoSignal,

    /// Show the most recent N readings.
    #[arg(long, default_value_t = 15)]
    pub rows: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export per-date scores to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the run (settings + scores) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Append logs to this file (the dashboard logs nowhere otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Dashboard only: refresh automatically every N seconds.
    #[arg(long, value_name = "SECS")]
    pub refresh_secs: Option<u64>,
}

/// Options for plotting a saved score file.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Score JSON file produced by `fstress score --export-json`.
    #[arg(long, value_name = "JSON")]
    pub scores: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_defaults() {
        let cli = Cli::try_parse_from(["fstress", "score", "--demo"]).unwrap();
        let Command::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert!(args.source.demo);
        assert_eq!(args.secured, "SOFR");
        assert_eq!(args.repo_signal, RepoSignal::LogChange5);
        assert!(!args.no_repo);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "fstress", "latest", "-k", "3.0", "--lookback", "90", "--asof", "2024-06-28",
            "--repo-signal", "delta-1", "--no-repo",
        ])
        .unwrap();
        let Command::Latest(args) = cli.command else {
            panic!("expected latest");
        };
        assert_eq!(args.tail_k, 3.0);
        assert_eq!(args.lookback, 90);
        assert_eq!(args.asof, NaiveDate::from_ymd_opt(2024, 6, 28));
        assert_eq!(args.repo_signal, RepoSignal::Delta1);
        assert!(args.no_repo);
    }

    #[test]
    fn demo_conflicts_with_data_dir() {
        assert!(Cli::try_parse_from(["fstress", "score", "--demo", "--data-dir", "x"]).is_err());
    }
}
