//! Mathematical utilities: sample statistics and the z-score normalizer.

pub mod stats;

pub use stats::*;
