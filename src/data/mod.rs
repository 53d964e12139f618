//! Series sources.
//!
//! Everything upstream of the scoring core goes through `SeriesSource`:
//!
//! - `nyfed`: NY Fed Markets API (reference rates, repo operations)
//! - `sample`: seeded synthetic series for offline runs
//! - `crate::io::ingest`: `<SERIES_ID>.csv` files from a local directory

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::debug;

use crate::domain::{Series, SeriesSpec};
use crate::error::AppError;

pub mod nyfed;
pub mod sample;

pub use nyfed::NyFedClient;
pub use sample::SampleSource;

pub trait SeriesSource: Send + Sync {
    /// Short name for status lines and logs.
    fn name(&self) -> &str;

    /// Observations for `spec` in `[start, end]`, sorted ascending by date.
    fn fetch_series(&self, spec: &SeriesSpec, start: NaiveDate, end: NaiveDate) -> Result<Series, AppError>;
}

/// Fetch every spec concurrently and join the results, in `specs` order.
///
/// Any single failure fails the whole batch.
pub fn fetch_all(
    source: &dyn SeriesSource,
    specs: &[SeriesSpec],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Series>, AppError> {
    specs
        .par_iter()
        .map(|spec| -> Result<Series, AppError> {
            let series = source.fetch_series(spec, start, end)?;
            debug!(source = source.name(), series = %spec.id, n = series.len(), "fetched series");
            Ok(series)
        })
        .collect()
}
