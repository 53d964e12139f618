//! Synthetic funding-market series for offline runs and demos.
//!
//! Series are generated on weekdays only. Stress episodes are drawn from the
//! source seed alone, so every series generated by one `SampleSource` agrees on
//! when the episodes happen; the day-to-day noise is seeded per series key.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};

use crate::data::SeriesSource;
use crate::domain::{Dataset, Observation, Series, SeriesSpec};
use crate::error::AppError;

/// Probability that a given weekday starts a stress episode.
const EPISODE_PROB: f64 = 0.012;
const EPISODE_DAYS: i64 = 4;
/// Share of weekdays the unsecured leg skips, to exercise date alignment.
const UNSECURED_GAP_PROB: f64 = 0.02;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// 64-bit FNV-1a. Fixed across toolchains, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8], init: u64) -> u64 {
    bytes
        .iter()
        .fold(init, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

#[derive(Debug, Clone)]
pub struct SampleSource {
    seed: u64,
}

impl SampleSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Weekdays covered by a stress episode, in `[start, end]`.
    fn episode_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = Vec::new();
        for day in weekdays(start, end) {
            if rng.gen_bool(EPISODE_PROB) {
                for offset in 0..EPISODE_DAYS {
                    let d = day + Duration::days(offset);
                    if d <= end && is_weekday(d) {
                        out.push(d);
                    }
                }
            }
        }
        out.sort();
        out.dedup();
        out
    }

    fn series_seed(&self, spec: &SeriesSpec) -> u64 {
        let tag = fnv1a(spec.dataset.display_name().as_bytes(), FNV_OFFSET);
        self.seed ^ fnv1a(spec.key.as_bytes(), tag)
    }
}

impl SeriesSource for SampleSource {
    fn name(&self) -> &str {
        "sample"
    }

    fn fetch_series(&self, spec: &SeriesSpec, start: NaiveDate, end: NaiveDate) -> Result<Series, AppError> {
        if end < start {
            return Err(AppError::config(format!("Empty sample window {start}..{end}.")));
        }

        let episodes = self.episode_days(start, end);
        let mut rng = StdRng::seed_from_u64(self.series_seed(spec));
        let profile = Profile::for_spec(spec);

        let noise = Normal::new(0.0, profile.noise)
            .map_err(|e| AppError::data(format!("Noise distribution error: {e}")))?;
        let volume = LogNormal::new(profile.volume_mu, 0.6)
            .map_err(|e| AppError::data(format!("Volume distribution error: {e}")))?;

        let mut observations = Vec::new();
        for day in weekdays(start, end) {
            if profile.gappy && rng.gen_bool(UNSECURED_GAP_PROB) {
                continue;
            }
            let stressed = episodes.binary_search(&day).is_ok();

            let value = match spec.dataset {
                Dataset::ReferenceRates => {
                    let bump = if stressed { profile.episode_bump } else { 0.0 };
                    // Rates are published to the basis point.
                    ((profile.level + bump + noise.sample(&mut rng)) * 100.0).round() / 100.0
                }
                Dataset::RepoOperations => {
                    if stressed {
                        volume.sample(&mut rng) * 50.0
                    } else if rng.gen_bool(0.3) {
                        volume.sample(&mut rng)
                    } else {
                        0.0
                    }
                }
            };
            observations.push(Observation::new(day, value));
        }

        Ok(Series::new(spec.id.clone(), observations))
    }
}

/// Per-series shape parameters.
struct Profile {
    level: f64,
    noise: f64,
    episode_bump: f64,
    volume_mu: f64,
    gappy: bool,
}

impl Profile {
    fn for_spec(spec: &SeriesSpec) -> Self {
        match (spec.dataset, spec.key.as_str()) {
            (Dataset::ReferenceRates, "SOFR" | "TGCR" | "BGCR") => Self {
                level: 5.31,
                noise: 0.008,
                episode_bump: 0.10,
                volume_mu: 0.0,
                gappy: false,
            },
            (Dataset::ReferenceRates, _) => Self {
                level: 5.33,
                noise: 0.003,
                episode_bump: 0.01,
                volume_mu: 0.0,
                gappy: true,
            },
            (Dataset::RepoOperations, _) => Self {
                level: 0.0,
                noise: 1.0,
                episode_bump: 0.0,
                // ~$1bn typical accepted amount.
                volume_mu: 1.0e9_f64.ln(),
                gappy: false,
            },
        }
    }
}

fn is_weekday(d: NaiveDate) -> bool {
    !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| is_weekday(*d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build_features;
    use crate::score::{TailModel, score_features};
    use crate::domain::RepoSignal;

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
    }

    #[test]
    fn deterministic_for_seed() {
        let (start, end) = window();
        let spec = SeriesSpec::reference_rate("SOFR");
        let a = SampleSource::new(7).fetch_series(&spec, start, end).unwrap();
        let b = SampleSource::new(7).fetch_series(&spec, start, end).unwrap();
        let c = SampleSource::new(8).fetch_series(&spec, start, end).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn series_seed_is_toolchain_stable() {
        assert_eq!(fnv1a(b"", FNV_OFFSET), FNV_OFFSET);
        assert_eq!(fnv1a(b"a", FNV_OFFSET), 0xaf63_dc4c_8601_ec8c);

        let source = SampleSource::new(0);
        let sofr = SeriesSpec::reference_rate("SOFR");
        let tag = fnv1a(b"reference rates", FNV_OFFSET);
        assert_eq!(source.series_seed(&sofr), fnv1a(b"SOFR", tag));
        assert_ne!(source.series_seed(&sofr), source.series_seed(&SeriesSpec::reference_rate("EFFR")));
    }

    #[test]
    fn weekdays_only_and_sorted() {
        let (start, end) = window();
        let s = SampleSource::new(1)
            .fetch_series(&SeriesSpec::reference_rate("EFFR"), start, end)
            .unwrap();
        assert!(!s.is_empty());
        assert!(s.observations.iter().all(|o| is_weekday(o.date)));
        assert!(s.observations.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn repo_volumes_are_non_negative() {
        let (start, end) = window();
        let s = SampleSource::new(3)
            .fetch_series(&SeriesSpec::repo_operations("REPO_TOTAL"), start, end)
            .unwrap();
        assert!(s.observations.iter().all(|o| o.value.unwrap() >= 0.0));
        assert!(s.observations.iter().any(|o| o.value == Some(0.0)));
    }

    #[test]
    fn reversed_window_is_rejected() {
        let (start, end) = window();
        let err = SampleSource::new(1)
            .fetch_series(&SeriesSpec::reference_rate("SOFR"), end, start)
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn generated_window_scores_end_to_end() {
        let (start, end) = window();
        let source = SampleSource::new(42);
        let secured = source.fetch_series(&SeriesSpec::reference_rate("SOFR"), start, end).unwrap();
        let unsecured = source.fetch_series(&SeriesSpec::reference_rate("EFFR"), start, end).unwrap();
        let repo = source
            .fetch_series(&SeriesSpec::repo_operations("REPO_TOTAL"), start, end)
            .unwrap();

        let rows = build_features(&secured, &unsecured, Some(&repo));
        assert!(rows.len() <= secured.len().min(unsecured.len()));

        let points = score_features(&rows, TailModel::default(), RepoSignal::LogChange5);
        assert_eq!(points.len(), rows.len());
        assert!(points.iter().all(|p| (0.0..=1.0).contains(&p.p_stress)));
    }
}
