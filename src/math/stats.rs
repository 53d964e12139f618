//! Sample statistics and z-score normalization.
//!
//! The normalizer is fitted once over a feature's full window. Missing and
//! non-finite inputs are skipped entirely: they count neither toward `n` nor
//! toward the mean/deviation.

use serde::{Deserialize, Serialize};

/// Divisor substituted when the sample standard deviation is undefined
/// (fewer than two finite values) or collapses to zero.
pub const STD_EPSILON: f64 = 1e-12;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator); `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Logistic function.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Mean/deviation fitted over one feature window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZScore {
    pub mean: f64,
    /// Always `>= STD_EPSILON`.
    pub std: f64,
    /// Finite values the fit was computed from.
    pub n: usize,
}

impl ZScore {
    pub fn fit<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let finite: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();

        let mean = mean(&finite).unwrap_or(0.0);
        let std = sample_std(&finite)
            .filter(|s| s.is_finite() && *s >= STD_EPSILON)
            .unwrap_or(STD_EPSILON);

        Self {
            mean,
            std,
            n: finite.len(),
        }
    }

    pub fn score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    /// True when the epsilon divisor is in use.
    pub fn is_degenerate(&self) -> bool {
        self.std <= STD_EPSILON
    }
}

/// Z-score of `value` against the finite values of `series`.
pub fn zscore(series: &[Option<f64>], value: f64) -> f64 {
    ZScore::fit(series.iter().copied()).score(value)
}
