//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - builds the series source and validated config
//! - runs the refresh pipeline
//! - prints reports/plots and writes optional exports

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, PlotArgs, ScoreArgs, SourceArgs};
use crate::data::{NyFedClient, SampleSource, SeriesSource};
use crate::domain::{SeriesSpec, StressConfig};
use crate::error::AppError;
use crate::io::CsvDirSource;
use crate::score::TailModel;

pub mod pipeline;

/// Entry point for the `fstress` binary.
pub fn run() -> Result<(), AppError> {
    // Must run before clap so `env = ...` attributes see `.env` values.
    dotenvy::dotenv().ok();

    // `fstress` and `fstress -k 3` behave like `fstress tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Score(args) => handle_score(args, OutputMode::Full),
        Command::Latest(args) => handle_score(args, OutputMode::HeadlineOnly),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    HeadlineOnly,
}

fn handle_score(args: ScoreArgs, mode: OutputMode) -> Result<(), AppError> {
    init_logging(args.log_file.as_deref(), true)?;
    let config = config_from_args(&args)?;
    let source = source_from_args(&args.source)?;

    let run = pipeline::run_refresh(source.as_ref(), &config)?;

    match mode {
        OutputMode::Full => {
            println!("{}", crate::report::format_run_summary(&run, &config));
            println!("{}", crate::report::format_score_table(&run.points, config.top_n));
            if config.plot {
                println!(
                    "{}",
                    crate::plot::render_stress_plot(&run.points, config.plot_width, config.plot_height)
                );
            }
        }
        OutputMode::HeadlineOnly => {
            print!("{}", crate::report::format_headline(&run));
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::write_scores_csv(path, &run.features, &run.points)?;
        tracing::info!(path = %path.display(), "wrote CSV export");
    }
    if let Some(path) = &config.export_json {
        crate::io::write_scores_json(path, &run, &config)?;
        tracing::info!(path = %path.display(), "wrote JSON export");
    }

    Ok(())
}

fn handle_tui(args: ScoreArgs) -> Result<(), AppError> {
    // Never log to the terminal the dashboard is drawing on.
    init_logging(args.log_file.as_deref(), false)?;
    let config = config_from_args(&args)?;
    let source = source_from_args(&args.source)?;
    crate::tui::run(config, source, args.refresh_secs)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_scores_json(&args.scores)?;
    println!("{}", crate::plot::render_score_file_plot(&file, args.width, args.height));
    Ok(())
}

/// Validate CLI/env settings into a `StressConfig`.
pub fn config_from_args(args: &ScoreArgs) -> Result<StressConfig, AppError> {
    let config = StressConfig {
        secured: SeriesSpec::reference_rate(&args.secured),
        unsecured: SeriesSpec::reference_rate(&args.unsecured),
        repo: (!args.no_repo).then(|| SeriesSpec::repo_operations(&args.repo_key)),
        lookback_days: args.lookback,
        asof: args.asof,
        tail: TailModel::with_k(args.tail_k),
        repo_signal: args.repo_signal,
        top_n: args.rows,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    };
    config.validate()?;
    Ok(config)
}

/// Pick the series source: `--demo`, then `--data-dir`, then the NY Fed API.
pub fn source_from_args(args: &SourceArgs) -> Result<Arc<dyn SeriesSource>, AppError> {
    if args.demo {
        return Ok(Arc::new(SampleSource::new(args.seed)));
    }
    if let Some(dir) = &args.data_dir {
        return Ok(Arc::new(CsvDirSource::new(dir)?));
    }
    Ok(Arc::new(NyFedClient::new(&args.base_url)?))
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. With a log file, events are
/// appended there; otherwise they go to stderr, or nowhere when `to_stderr`
/// is false.
fn init_logging(log_file: Option<&Path>, to_stderr: bool) -> Result<(), AppError> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::config(format!("Failed to open log file '{}': {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None if to_stderr => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init(),
        None => return Ok(()),
    };

    // A subscriber may already be installed (e.g. in tests); keep it.
    let _ = result;
    Ok(())
}

/// Rewrite argv so `fstress` defaults to `fstress tui`.
///
/// Rules:
/// - `fstress`                      -> `fstress tui`
/// - `fstress -k 3 ...`             -> `fstress tui -k 3 ...`
/// - `fstress --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "score" | "latest" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}
