//! `funding-stress` library crate.
//!
//! The binary (`fstress`) is a thin wrapper around this library so that:
//!
//! - the scoring core is testable without spawning processes or touching the network
//! - the CLI and the dashboard share one refresh pipeline
//!
//! Data flow: `data` (fetch) -> `features` (align, spread, repo changes)
//! -> `math` (z-scores) -> `score` (tail probabilities, combine, classify)
//! -> `report` / `plot` / `io` / `tui`.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod score;
pub mod tui;
