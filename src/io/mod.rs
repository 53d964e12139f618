//! Input/output helpers.
//!
//! - CSV directory series source (`ingest`)
//! - per-date score exports (CSV) (`export`)
//! - score JSON read/write (`scores`)

pub mod export;
pub mod ingest;
pub mod scores;

pub use export::*;
pub use ingest::*;
pub use scores::*;
