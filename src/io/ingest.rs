//! Local CSV series source.
//!
//! Each series lives in `<dir>/<SERIES_ID>.csv` with a header row containing
//! `date` and `value` columns (any order, extra columns ignored). A blank or
//! `.` value is kept as a missing observation; a bad date is an error.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::debug;

use crate::data::SeriesSource;
use crate::domain::{Observation, Series, SeriesSpec};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(AppError::config(format!(
                "Data directory '{}' does not exist.",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn path_for(&self, spec: &SeriesSpec) -> PathBuf {
        self.dir.join(format!("{}.csv", spec.id))
    }
}

impl SeriesSource for CsvDirSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_series(&self, spec: &SeriesSpec, start: NaiveDate, end: NaiveDate) -> Result<Series, AppError> {
        let path = self.path_for(spec);
        let mut observations = read_observations(&path)?;
        let total = observations.len();

        observations.retain(|o| o.date >= start && o.date <= end);
        observations.sort_by_key(|o| o.date);
        debug!(path = %path.display(), total, kept = observations.len(), "read series file");

        Ok(Series::new(spec.id.clone(), observations))
    }
}

/// Read every observation from one series file, in file order.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open series CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read CSV headers in '{}': {e}", path.display())))?
        .clone();
    let columns = header_map(&headers);
    let (Some(&date_col), Some(&value_col)) = (columns.get("date"), columns.get("value")) else {
        return Err(AppError::config(format!(
            "'{}' needs `date` and `value` columns.",
            path.display()
        )));
    };

    let mut out = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1 and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| {
            AppError::config(format!("CSV parse error in '{}' line {line}: {e}", path.display()))
        })?;

        let raw_date = record.get(date_col).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            AppError::config(format!(
                "Invalid date '{raw_date}' in '{}' line {line}: {e}",
                path.display()
            ))
        })?;

        let value = parse_value(record.get(value_col).unwrap_or_default());
        out.push(Observation { date, value });
    }

    Ok(out)
}

fn header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_ascii_lowercase(), i))
        .collect()
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("funding-stress-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    #[test]
    fn reads_filters_and_sorts() {
        let dir = temp_dir("ingest-ok");
        fs::write(
            dir.join("SOFR.csv"),
            "Value,Date,note\n5.31,2024-02-05,x\n5.30,2024-02-02,\n.,2024-02-06,holiday\n5.40,2024-03-01,\n",
        )
        .unwrap();

        let source = CsvDirSource::new(&dir).unwrap();
        let s = source
            .fetch_series(&SeriesSpec::reference_rate("SOFR"), d(1), d(29))
            .unwrap();

        assert_eq!(
            s.observations,
            vec![
                Observation::new(d(2), 5.30),
                Observation::new(d(5), 5.31),
                Observation::missing(d(6)),
            ]
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn bad_date_reports_line() {
        let dir = temp_dir("ingest-bad");
        fs::write(dir.join("EFFR.csv"), "date,value\n2024-02-01,5.33\n02/02/2024,5.33\n").unwrap();

        let source = CsvDirSource::new(&dir).unwrap();
        let err = source
            .fetch_series(&SeriesSpec::reference_rate("EFFR"), d(1), d(29))
            .unwrap_err();
        assert!(err.message().contains("line 3"), "{err}");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_columns_and_files_are_errors() {
        let dir = temp_dir("ingest-cols");
        fs::write(dir.join("REPO_TOTAL.csv"), "day,amount\n2024-02-01,1\n").unwrap();

        let source = CsvDirSource::new(&dir).unwrap();
        assert!(source
            .fetch_series(&SeriesSpec::repo_operations("REPO_TOTAL"), d(1), d(29))
            .is_err());
        assert!(source
            .fetch_series(&SeriesSpec::reference_rate("OBFR"), d(1), d(29))
            .is_err());
        assert!(CsvDirSource::new(dir.join("nope")).is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
