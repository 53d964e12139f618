//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw inputs (`Observation`, `Series`, `SeriesSpec`)
//! - derived rows (`AlignedRow`, `FeatureRow`)
//! - scoring outputs (`ScorePoint`, `ScoreFile`)
//! - the validated run configuration (`StressConfig`)

pub mod types;

pub use types::*;
