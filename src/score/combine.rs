//! Stress combiner.
//!
//! Two tail probabilities are merged with the "at least one fires" rule:
//!
//! `p_stress = 1 - (1 - p_spread) * (1 - p_repo)`
//!
//! which assumes the spread and repo signals are independent. The formula is
//! kept exactly as published so scores stay comparable across versions.

use crate::domain::{FeatureRow, RepoSignal, ScorePoint};
use crate::math::ZScore;
use crate::score::TailModel;

/// Probability that at least one of two independent tail events fired.
pub fn combine(p_spread: f64, p_repo: f64) -> f64 {
    (1.0 - (1.0 - p_spread) * (1.0 - p_repo)).clamp(0.0, 1.0)
}

/// Lazily scored view over a feature window.
///
/// The normalizers are fitted once at construction; each call to `iter()`
/// starts a fresh pass over the rows, so the sequence can be replayed.
#[derive(Debug, Clone)]
pub struct StressScores<'a> {
    rows: &'a [FeatureRow],
    spread_z: ZScore,
    repo_z: ZScore,
    tail: TailModel,
    signal: RepoSignal,
}

impl<'a> StressScores<'a> {
    pub fn new(rows: &'a [FeatureRow], tail: TailModel, signal: RepoSignal) -> Self {
        let spread_z = ZScore::fit(rows.iter().map(|r| r.spread));
        let repo_z = ZScore::fit(rows.iter().map(|r| r.repo_feature(signal)));
        Self {
            rows,
            spread_z,
            repo_z,
            tail,
            signal,
        }
    }

    pub fn iter(&self) -> ScoreIter<'_, 'a> {
        ScoreIter {
            scores: self,
            rows: self.rows.iter(),
        }
    }

    /// Most recent scoreable reading.
    pub fn latest(&self) -> Option<ScorePoint> {
        self.rows.iter().rev().find_map(|row| self.score_row(row))
    }

    pub fn spread_stats(&self) -> ZScore {
        self.spread_z
    }

    pub fn repo_stats(&self) -> ZScore {
        self.repo_z
    }

    fn score_row(&self, row: &FeatureRow) -> Option<ScorePoint> {
        let spread = row.spread.filter(|v| v.is_finite())?;
        let z_spread = self.spread_z.score(spread);
        let p_spread = self.tail.prob(z_spread);

        let z_repo = row
            .repo_feature(self.signal)
            .filter(|v| v.is_finite())
            .map(|v| self.repo_z.score(v));
        // No volume signal is not evidence of stress.
        let p_repo = z_repo.map(|z| self.tail.prob(z)).unwrap_or(0.0);

        Some(ScorePoint {
            date: row.date,
            p_stress: combine(p_spread, p_repo),
            p_spread,
            p_repo,
            z_spread,
            z_repo,
        })
    }
}

impl<'s, 'a> IntoIterator for &'s StressScores<'a> {
    type Item = ScorePoint;
    type IntoIter = ScoreIter<'s, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over a `StressScores` window, skipping rows without a spread.
pub struct ScoreIter<'s, 'a> {
    scores: &'s StressScores<'a>,
    rows: std::slice::Iter<'a, FeatureRow>,
}

impl Iterator for ScoreIter<'_, '_> {
    type Item = ScorePoint;

    fn next(&mut self) -> Option<ScorePoint> {
        for row in self.rows.by_ref() {
            if let Some(point) = self.scores.score_row(row) {
                return Some(point);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.rows.size_hint().1)
    }
}

/// Score every row eagerly.
pub fn score_features(rows: &[FeatureRow], tail: TailModel, signal: RepoSignal) -> Vec<ScorePoint> {
    StressScores::new(rows, tail, signal).iter().collect()
}
