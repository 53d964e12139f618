//! Feature derivation: rate spread and repo-volume changes.
//!
//! Lagged features are index-aligned with their input and `None` wherever the
//! lag reaches before the start of the series or touches a missing value.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{FeatureRow, Observation, Series};
use crate::features::align::align;

pub const DELTA_LAG: usize = 1;
pub const LOG_CHANGE_LAG: usize = 5;

/// `values[i] - values[i - lag]`.
pub fn delta(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    lagged(values, lag, |cur, prev| cur - prev)
}

/// `ln(1 + values[i]) - ln(1 + values[i - lag])`.
///
/// `ln_1p` keeps zero volumes well defined.
pub fn log_change(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    lagged(values, lag, |cur, prev| cur.ln_1p() - prev.ln_1p())
}

fn lagged(values: &[Option<f64>], lag: usize, f: impl Fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if lag == 0 || i < lag {
                return None;
            }
            let cur = values[i]?;
            let prev = values[i - lag]?;
            Some(f(cur, prev)).filter(|v| v.is_finite())
        })
        .collect()
}

/// `secured - unsecured` on every date both legs share, in the secured leg's order.
pub fn spread(secured: &Series, unsecured: &Series) -> Series {
    let observations = align(secured, unsecured)
        .into_iter()
        .map(|row| match (row.a(), row.b()) {
            (Some(s), Some(u)) if (s - u).is_finite() => Observation::new(row.date, s - u),
            _ => Observation::missing(row.date),
        })
        .collect();

    Series::new(format!("{}-{}", secured.id, unsecured.id), observations)
}

/// Repo-volume features, index-aligned with the volume series.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoFeatures {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
    pub delta1: Vec<Option<f64>>,
    pub log_chg5: Vec<Option<f64>>,
}

pub fn repo_features(repo: &Series) -> RepoFeatures {
    let values = repo.values();
    RepoFeatures {
        dates: repo.observations.iter().map(|o| o.date).collect(),
        delta1: delta(&values, DELTA_LAG),
        log_chg5: log_change(&values, LOG_CHANGE_LAG),
        values,
    }
}

/// One `FeatureRow` per spread date, with repo features attached by exact date.
pub fn build_features(secured: &Series, unsecured: &Series, repo: Option<&Series>) -> Vec<FeatureRow> {
    let spread = spread(secured, unsecured);
    let repo = repo.map(repo_features);

    let repo_index: HashMap<NaiveDate, usize> = repo
        .as_ref()
        .map(|r| r.dates.iter().enumerate().map(|(i, d)| (*d, i)).collect())
        .unwrap_or_default();

    spread
        .observations
        .iter()
        .map(|obs| {
            let mut row = FeatureRow {
                date: obs.date,
                spread: obs.value,
                repo_val: None,
                repo_delta1: None,
                repo_log_chg5: None,
            };
            if let (Some(r), Some(&i)) = (repo.as_ref(), repo_index.get(&obs.date)) {
                row.repo_val = r.values[i];
                row.repo_delta1 = r.delta1[i];
                row.repo_log_chg5 = r.log_chg5[i];
            }
            row
        })
        .collect()
}
