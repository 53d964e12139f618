//! Feature pipeline: date alignment and engineered features.

pub mod align;
pub mod build;

pub use align::*;
pub use build::*;
