//! Stress scoring.
//!
//! Responsibilities:
//!
//! - map z-scores to tail probabilities (`tail`)
//! - combine the spread and repo probabilities per date (`combine`)
//! - bucket a probability into a display band (`classify`)

pub mod classify;
pub mod combine;
pub mod tail;

pub use classify::*;
pub use combine::*;
pub use tail::*;
