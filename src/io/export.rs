//! Export scored readings to CSV.
//!
//! One row per `ScorePoint`, with the features that produced it, so the file
//! is easy to audit in a spreadsheet.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{FeatureRow, ScorePoint};
use crate::error::AppError;

const HEADER: &str = "date,spread,repo_val,repo_delta1,repo_log_chg5,z_spread,z_repo,p_spread,p_repo,p_stress,band";

/// Write per-date scores to a CSV file.
pub fn write_scores_csv(path: &Path, features: &[FeatureRow], points: &[ScorePoint]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_scores(&mut file, features, points)
        .map_err(|e| AppError::config(format!("Failed to write export CSV '{}': {e}", path.display())))
}

fn write_scores<W: Write>(out: &mut W, features: &[FeatureRow], points: &[ScorePoint]) -> std::io::Result<()> {
    let by_date: HashMap<_, _> = features.iter().map(|f| (f.date, f)).collect();

    writeln!(out, "{HEADER}")?;
    for p in points {
        let f = by_date.get(&p.date);
        writeln!(
            out,
            "{},{},{},{},{},{:.6},{},{:.6},{:.6},{:.6},{}",
            p.date,
            opt(f.and_then(|f| f.spread), 6),
            opt(f.and_then(|f| f.repo_val), 2),
            opt(f.and_then(|f| f.repo_delta1), 2),
            opt(f.and_then(|f| f.repo_log_chg5), 6),
            p.z_spread,
            opt(p.z_repo, 6),
            p.p_spread,
            p.p_repo,
            p.p_stress,
            p.band().display_name().to_lowercase(),
        )?;
    }
    Ok(())
}

fn opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rows_carry_features_and_blank_missing_values() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let features = vec![FeatureRow {
            date,
            spread: Some(-0.02),
            repo_val: Some(0.0),
            repo_delta1: None,
            repo_log_chg5: None,
        }];
        let points = vec![ScorePoint {
            date,
            p_stress: 0.85,
            p_spread: 0.85,
            p_repo: 0.0,
            z_spread: 3.25,
            z_repo: None,
        }];

        let mut buf = Vec::new();
        write_scores(&mut buf, &features, &points).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            "2024-04-01,-0.020000,0.00,,,3.250000,,0.850000,0.000000,0.850000,high"
        );
    }
}
