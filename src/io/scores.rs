//! Read/write score JSON files.
//!
//! A score file is the portable record of one run: window, tail settings,
//! series specs, and the full `ScorePoint` sequence. `fstress plot --scores`
//! reads it back. The schema is `domain::ScoreFile`.

use std::fs::File;
use std::path::Path;

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{ScoreFile, StressConfig};
use crate::error::AppError;

pub fn score_file(run: &RunOutput, config: &StressConfig) -> ScoreFile {
    ScoreFile {
        tool: "fstress".to_string(),
        generated: Local::now().to_rfc3339(),
        window_start: run.snapshot.start,
        window_end: run.snapshot.end,
        tail: config.tail,
        repo_signal: config.repo_signal,
        series: config.series_specs(),
        latest_band: run.band,
        points: run.points.clone(),
    }
}

/// Write a score JSON file.
pub fn write_scores_json(path: &Path, run: &RunOutput, config: &StressConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create score JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &score_file(run, config))
        .map_err(|e| AppError::config(format!("Failed to write score JSON: {e}")))
}

/// Read a score JSON file.
pub fn read_scores_json(path: &Path) -> Result<ScoreFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open score JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::config(format!("Invalid score JSON: {e}")))
}
