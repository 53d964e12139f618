//! Shared refresh pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch (concurrent) -> align/features -> z-score -> tail probabilities -> combine -> classify
//!
//! A refresh either produces a complete `RunOutput` or an error; callers keep
//! whatever they were showing before when it fails.

use chrono::{DateTime, Local, NaiveDate};
use tracing::{info, warn};

use crate::data::{SeriesSource, fetch_all};
use crate::domain::{FeatureRow, ScorePoint, Series, StressConfig};
use crate::error::AppError;
use crate::features::build_features;
use crate::math::ZScore;
use crate::report::{Alert, alert_for};
use crate::score::{RiskBand, StressScores};

/// Raw series for one fetch window.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub secured: Series,
    pub unsecured: Series,
    pub repo: Option<Series>,
    pub fetched_at: DateTime<Local>,
}

/// All computed outputs of a single refresh.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub snapshot: Snapshot,
    pub features: Vec<FeatureRow>,
    pub points: Vec<ScorePoint>,
    pub spread_stats: ZScore,
    pub repo_stats: ZScore,
    /// Last element of `points`.
    pub latest: ScorePoint,
    pub band: RiskBand,
    pub alert: Option<Alert>,
}

/// Fetch every configured series for the current window.
pub fn fetch_snapshot(source: &dyn SeriesSource, config: &StressConfig) -> Result<Snapshot, AppError> {
    let (start, end) = config.fetch_window(Local::now().date_naive());
    info!(source = source.name(), %start, %end, "refreshing");

    let mut fetched = fetch_all(source, &config.series_specs(), start, end)?.into_iter();
    let (Some(secured), Some(unsecured)) = (fetched.next(), fetched.next()) else {
        return Err(AppError::data("Source returned fewer series than requested."));
    };
    let repo = fetched.next();

    for series in [Some(&secured), Some(&unsecured), repo.as_ref()].into_iter().flatten() {
        if series.is_empty() {
            warn!(series = %series.id, "no observations in window");
        }
    }

    Ok(Snapshot {
        source: source.name().to_string(),
        start,
        end,
        secured,
        unsecured,
        repo,
        fetched_at: Local::now(),
    })
}

/// Fetch and score in one step.
pub fn run_refresh(source: &dyn SeriesSource, config: &StressConfig) -> Result<RunOutput, AppError> {
    let snapshot = fetch_snapshot(source, config)?;
    run_with_snapshot(config, snapshot)
}

/// Score a pre-fetched snapshot.
///
/// This is useful for the TUI where we want to re-score after a sensitivity
/// change without re-fetching.
pub fn run_with_snapshot(config: &StressConfig, snapshot: Snapshot) -> Result<RunOutput, AppError> {
    let features = build_features(&snapshot.secured, &snapshot.unsecured, snapshot.repo.as_ref());

    let scores = StressScores::new(&features, config.tail, config.repo_signal);
    let points: Vec<ScorePoint> = scores.iter().collect();
    let spread_stats = scores.spread_stats();
    let repo_stats = scores.repo_stats();

    let Some(latest) = points.last().copied() else {
        return Err(AppError::data(format!(
            "No dates with both {} and {} between {} and {}.",
            snapshot.secured.id, snapshot.unsecured.id, snapshot.start, snapshot.end
        )));
    };

    let band = latest.band();
    let alert = alert_for(&latest);
    info!(
        n = points.len(),
        date = %latest.date,
        p_stress = latest.p_stress,
        band = band.display_name(),
        "scored"
    );

    Ok(RunOutput {
        snapshot,
        features,
        points,
        spread_stats,
        repo_stats,
        latest,
        band,
        alert,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SampleSource;
    use crate::domain::{Observation, SeriesSpec};

    struct StaticSource {
        secured: Vec<f64>,
        unsecured: Vec<f64>,
        repo: Vec<f64>,
    }

    impl SeriesSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch_series(&self, spec: &SeriesSpec, start: NaiveDate, _end: NaiveDate) -> Result<Series, AppError> {
            let values = match spec.id.as_str() {
                "SOFR" => &self.secured,
                "EFFR" => &self.unsecured,
                _ => &self.repo,
            };
            let obs = values
                .iter()
                .enumerate()
                .map(|(i, &v)| Observation::new(start + chrono::Duration::days(i as i64), v))
                .collect();
            Ok(Series::new(spec.id.clone(), obs))
        }
    }

    fn config() -> StressConfig {
        StressConfig {
            asof: NaiveDate::from_ymd_opt(2024, 3, 29),
            ..StressConfig::default()
        }
    }

    #[test]
    fn three_day_scenario() {
        let source = StaticSource {
            secured: vec![5.31, 5.32, 5.30],
            unsecured: vec![5.33, 5.31, 5.29],
            repo: vec![0.0, 1.0e9, 2.0e9, 0.0],
        };
        let run = run_refresh(&source, &config()).unwrap();

        assert_eq!(run.points.len(), 3);
        assert!(run.spread_stats.mean.abs() < 1e-9);
        assert!(run.points.iter().all(|p| p.p_repo == 0.0));
        assert_eq!(run.latest, run.points[2]);
        assert_eq!(run.band, RiskBand::Normal);
        assert!(run.alert.is_none());
    }

    #[test]
    fn no_overlap_is_an_error() {
        let source = StaticSource {
            secured: vec![],
            unsecured: vec![5.33],
            repo: vec![],
        };
        let err = run_refresh(&source, &config()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }

    #[test]
    fn rescoring_reuses_snapshot() {
        let config = config();
        let snapshot = fetch_snapshot(&SampleSource::new(11), &config).unwrap();

        let base = run_with_snapshot(&config, snapshot.clone()).unwrap();
        let sensitive = StressConfig {
            tail: crate::score::TailModel::with_k(0.5),
            ..config.clone()
        };
        let rescored = run_with_snapshot(&sensitive, snapshot).unwrap();

        assert_eq!(base.points.len(), rescored.points.len());
        assert_eq!(base.snapshot.fetched_at, rescored.snapshot.fetched_at);
        for (a, b) in base.points.iter().zip(&rescored.points) {
            assert!(b.p_spread >= a.p_spread);
        }
    }

    #[test]
    fn window_matches_config() {
        let config = config();
        let snapshot = fetch_snapshot(&SampleSource::new(1), &config).unwrap();
        assert_eq!(snapshot.end, NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        assert!(snapshot.repo.is_some());
        assert!(snapshot.secured.last_date().unwrap() <= snapshot.end);
    }
}
