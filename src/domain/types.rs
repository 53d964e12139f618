//! Shared domain types.
//!
//! These types are intentionally plain data so they can be:
//!
//! - produced by any `SeriesSource` (HTTP, CSV, synthetic)
//! - scored without touching I/O
//! - exported to JSON/CSV and reloaded later for plotting

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::score::{RiskBand, TailModel, classify};

/// Default NY Fed reference rate used as the secured leg of the spread.
pub const DEFAULT_SECURED_KEY: &str = "SOFR";
/// Default NY Fed reference rate used as the unsecured leg of the spread.
pub const DEFAULT_UNSECURED_KEY: &str = "EFFR";
/// Default repo operation aggregate used as the volume signal.
pub const DEFAULT_REPO_KEY: &str = "REPO_TOTAL";

pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;
pub const MIN_LOOKBACK_DAYS: u32 = 30;
pub const MAX_LOOKBACK_DAYS: u32 = 5000;
/// Extra calendar days fetched ahead of the lookback so weekends and holidays
/// do not eat into the scored window.
pub const LOOKBACK_PAD_DAYS: i64 = 10;

/// One dated value. `None` means the source published the date without a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, value: None }
    }
}

/// An ordered (ascending by date) run of observations for one series id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub observations: Vec<Observation>,
}

impl Series {
    pub fn new(id: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            id: id.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Values in series order, index-aligned with `observations`.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }
}

/// Which NY Fed Markets dataset a series is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Reference rates (`/rates/...`): SOFR, EFFR, OBFR, TGCR, BGCR.
    ReferenceRates,
    /// Repo and reverse repo operation results (`/rp/...`).
    RepoOperations,
}

impl Dataset {
    pub fn display_name(self) -> &'static str {
        match self {
            Dataset::ReferenceRates => "reference rates",
            Dataset::RepoOperations => "repo operations",
        }
    }
}

/// What to fetch: a stable id plus the dataset/key pair the source understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub id: String,
    pub label: String,
    pub dataset: Dataset,
    pub key: String,
}

impl SeriesSpec {
    pub fn reference_rate(key: &str) -> Self {
        let key = key.trim().to_uppercase();
        Self {
            id: key.clone(),
            label: format!("{key} (overnight rate, %)"),
            dataset: Dataset::ReferenceRates,
            key,
        }
    }

    pub fn repo_operations(key: &str) -> Self {
        let key = key.trim().to_uppercase();
        Self {
            id: key.clone(),
            label: format!("{key} (operation volume, $)"),
            dataset: Dataset::RepoOperations,
            key,
        }
    }
}

/// Values from two or more series that share a date.
///
/// `values[i]` comes from the i-th series passed to the aligner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl AlignedRow {
    /// Value from the left (first) series.
    pub fn a(&self) -> Option<f64> {
        self.values.first().copied().flatten()
    }

    /// Value from the second series.
    pub fn b(&self) -> Option<f64> {
        self.values.get(1).copied().flatten()
    }
}

/// Engineered features for one spread date.
///
/// Repo features are `None` whenever the volume series lacks the history
/// (or the date) needed to compute them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub spread: Option<f64>,
    pub repo_val: Option<f64>,
    pub repo_delta1: Option<f64>,
    pub repo_log_chg5: Option<f64>,
}

impl FeatureRow {
    pub fn repo_feature(&self, signal: RepoSignal) -> Option<f64> {
        match signal {
            RepoSignal::LogChange5 => self.repo_log_chg5,
            RepoSignal::Delta1 => self.repo_delta1,
        }
    }
}

/// Which repo-volume feature drives `p_repo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RepoSignal {
    /// `ln(1 + v[i]) - ln(1 + v[i-5])`.
    #[value(name = "log-change-5")]
    LogChange5,
    /// `v[i] - v[i-1]`.
    #[value(name = "delta-1")]
    Delta1,
}

impl RepoSignal {
    pub fn display_name(self) -> &'static str {
        match self {
            RepoSignal::LogChange5 => "5d log change",
            RepoSignal::Delta1 => "1d delta",
        }
    }

    pub fn next(self) -> Self {
        match self {
            RepoSignal::LogChange5 => RepoSignal::Delta1,
            RepoSignal::Delta1 => RepoSignal::LogChange5,
        }
    }
}

/// Scored reading for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub date: NaiveDate,
    pub p_stress: f64,
    pub p_spread: f64,
    pub p_repo: f64,
    pub z_spread: f64,
    /// Repo-feature z-score, when the repo feature existed on this date.
    #[serde(default)]
    pub z_repo: Option<f64>,
}

impl ScorePoint {
    pub fn band(&self) -> RiskBand {
        classify(self.p_stress)
    }
}

/// Portable JSON representation of one scored run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreFile {
    pub tool: String,
    pub generated: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub tail: TailModel,
    pub repo_signal: RepoSignal,
    pub series: Vec<SeriesSpec>,
    pub latest_band: RiskBand,
    pub points: Vec<ScorePoint>,
}

/// Fully validated settings for one refresh cycle.
#[derive(Debug, Clone)]
pub struct StressConfig {
    pub secured: SeriesSpec,
    pub unsecured: SeriesSpec,
    pub repo: Option<SeriesSpec>,
    pub lookback_days: u32,
    /// Last date of the window; `None` means today.
    pub asof: Option<NaiveDate>,
    pub tail: TailModel,
    pub repo_signal: RepoSignal,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            secured: SeriesSpec::reference_rate(DEFAULT_SECURED_KEY),
            unsecured: SeriesSpec::reference_rate(DEFAULT_UNSECURED_KEY),
            repo: Some(SeriesSpec::repo_operations(DEFAULT_REPO_KEY)),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            asof: None,
            tail: TailModel::default(),
            repo_signal: RepoSignal::LogChange5,
            top_n: 15,
            plot: true,
            plot_width: 100,
            plot_height: 20,
            export_csv: None,
            export_json: None,
        }
    }
}

impl StressConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.tail.k.is_finite() && self.tail.k > 0.0) {
            return Err(AppError::config(format!(
                "Tail sensitivity k must be a positive number (got {}).",
                self.tail.k
            )));
        }
        if !(self.tail.steepness.is_finite() && self.tail.steepness > 0.0) {
            return Err(AppError::config("Tail steepness must be a positive number."));
        }
        if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(AppError::config(format!(
                "Lookback must be between {MIN_LOOKBACK_DAYS} and {MAX_LOOKBACK_DAYS} days (got {}).",
                self.lookback_days
            )));
        }
        for leg in [&self.secured, &self.unsecured] {
            // A rate leg must name one reference rate; "ALL" would mix them.
            if leg.key.is_empty() || leg.key == "ALL" {
                return Err(AppError::config(format!(
                    "Rate leg '{}' must name a single reference rate (e.g. SOFR, EFFR).",
                    leg.key
                )));
            }
        }
        if self.secured.id == self.unsecured.id {
            return Err(AppError::config(format!(
                "Secured and unsecured legs are the same series ({}).",
                self.secured.id
            )));
        }
        Ok(())
    }

    /// Inclusive `(start, end)` fetch range for a run ending on `today` unless
    /// an explicit as-of date is configured.
    pub fn fetch_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.asof.unwrap_or(today);
        let start = end - Duration::days(i64::from(self.lookback_days) + LOOKBACK_PAD_DAYS);
        (start, end)
    }

    /// Series to fetch, in `[secured, unsecured, repo?]` order.
    pub fn series_specs(&self) -> Vec<SeriesSpec> {
        let mut specs = vec![self.secured.clone(), self.unsecured.clone()];
        if let Some(repo) = &self.repo {
            specs.push(repo.clone());
        }
        specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fetch_window_pads_lookback() {
        let config = StressConfig {
            lookback_days: 30,
            ..StressConfig::default()
        };
        let (start, end) = config.fetch_window(d(2024, 3, 31));
        assert_eq!(end, d(2024, 3, 31));
        assert_eq!(start, d(2024, 2, 20));
    }

    #[test]
    fn asof_overrides_today() {
        let config = StressConfig {
            asof: Some(d(2023, 12, 29)),
            ..StressConfig::default()
        };
        let (_, end) = config.fetch_window(d(2024, 3, 31));
        assert_eq!(end, d(2023, 12, 29));
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut config = StressConfig::default();
        assert!(config.validate().is_ok());

        config.tail.k = 0.0;
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);

        config.tail.k = 2.5;
        config.lookback_days = 10;
        assert!(config.validate().is_err());

        config.lookback_days = 365;
        config.unsecured = config.secured.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_aggregate_rate_keys() {
        for key in ["ALL", "all", " "] {
            let config = StressConfig {
                unsecured: SeriesSpec::reference_rate(key),
                ..StressConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG, "{key}");
        }
        assert!(StressConfig::default().validate().is_ok());
    }

    #[test]
    fn series_specs_skip_missing_repo() {
        let mut config = StressConfig::default();
        assert_eq!(config.series_specs().len(), 3);
        config.repo = None;
        let ids: Vec<String> = config.series_specs().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["SOFR".to_string(), "EFFR".to_string()]);
    }

    #[test]
    fn repo_feature_follows_signal() {
        let row = FeatureRow {
            date: d(2024, 1, 2),
            spread: Some(0.01),
            repo_val: Some(10.0),
            repo_delta1: Some(2.0),
            repo_log_chg5: None,
        };
        assert_eq!(row.repo_feature(RepoSignal::Delta1), Some(2.0));
        assert_eq!(row.repo_feature(RepoSignal::LogChange5), None);
    }
}
