//! NY Fed Markets API integration (reference rates and repo operations).
//!
//! Each dataset has a preferred date-range endpoint and one or more shorter
//! "recent" endpoints that are tried in order when the preferred one fails.
//! Payload values arrive as numbers or strings depending on the endpoint, so
//! rows are read through the lenient `coerce_*` helpers.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::data::SeriesSource;
use crate::domain::{Dataset, Observation, Series, SeriesSpec};
use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://markets.newyorkfed.org/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const RATE_DATE_KEYS: &[&str] = &["effectiveDate", "date"];
const RATE_VALUE_KEYS: &[&str] = &[
    "percentRate",
    "value",
    "index",
    "average30day",
    "average90day",
    "average180day",
];
const OP_DATE_KEYS: &[&str] = &["operationDate", "effectiveDate", "date"];
const OP_VALUE_KEYS: &[&str] = &[
    "totalAmtAccepted",
    "totalAcceptedAmt",
    "totalAmtSubmitted",
    "acceptedAmount",
    "amount",
    "value",
];

type Row = Map<String, Value>;

pub struct NyFedClient {
    client: Client,
    base_url: String,
}

impl NyFedClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::data(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch_reference_rates(
        &self,
        spec: &SeriesSpec,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>, AppError> {
        let candidates = [
            (format!("{}/rates/all/search.json", self.base_url), Some(date_params(start, end))),
            (format!("{}/rates/all/latest.json", self.base_url), None),
        ];
        let body: RatesResponse = self.first_success(&candidates)?;
        Ok(parse_reference_rates(&body.ref_rates, &spec.key, start, end))
    }

    fn fetch_repo_operations(
        &self,
        spec: &SeriesSpec,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>, AppError> {
        let legs = RepoLegs::from_key(&spec.key)?;
        let candidates = [
            (format!("{}/rp/rpops/search.json", self.base_url), Some(date_params(start, end))),
            (format!("{}/rp/rpops/lastTwoWeeks.json", self.base_url), None),
            (format!("{}/rp/all/all/results/lastTwoWeeks.json", self.base_url), None),
        ];
        let body: RepoResponse = self.first_success(&candidates)?;
        Ok(parse_repo_operations(&body, legs, start, end))
    }

    /// Try each endpoint in order and decode the first that answers.
    fn first_success<T: DeserializeOwned>(
        &self,
        candidates: &[(String, Option<Vec<(&'static str, String)>>)],
    ) -> Result<T, AppError> {
        let mut last_err = None;
        for (url, params) in candidates {
            match self.get_json(url, params.as_deref()) {
                Ok(body) => return Ok(body),
                Err(err) => {
                    warn!(url = %url, error = %err, "NY Fed endpoint failed; trying next");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AppError::data("No NY Fed endpoint configured.")))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, params: Option<&[(&str, String)]>) -> Result<T, AppError> {
        let mut req = self.client.get(url);
        if let Some(params) = params {
            req = req.query(params);
        }

        let resp = req
            .send()
            .map_err(|e| AppError::data(format!("NY Fed request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::data(format!(
                "NY Fed request to {url} failed with status {}.",
                resp.status()
            )));
        }

        resp.json()
            .map_err(|e| AppError::data(format!("Failed to parse NY Fed response from {url}: {e}")))
    }
}

impl SeriesSource for NyFedClient {
    fn name(&self) -> &str {
        "nyfed"
    }

    fn fetch_series(&self, spec: &SeriesSpec, start: NaiveDate, end: NaiveDate) -> Result<Series, AppError> {
        debug!(series = %spec.id, dataset = spec.dataset.display_name(), %start, %end, "requesting");
        let observations = match spec.dataset {
            Dataset::ReferenceRates => self.fetch_reference_rates(spec, start, end)?,
            Dataset::RepoOperations => self.fetch_repo_operations(spec, start, end)?,
        };
        Ok(Series::new(spec.id.clone(), observations))
    }
}

fn date_params(start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    vec![("startDate", start.to_string()), ("endDate", end.to_string())]
}

#[derive(Debug, Default, Deserialize)]
struct RatesResponse {
    #[serde(rename = "refRates", default)]
    ref_rates: Vec<Row>,
}

#[derive(Debug, Default, Deserialize)]
struct RepoResponse {
    #[serde(default)]
    repo: Option<OperationBlock>,
    #[serde(rename = "reverseRepo", default)]
    reverse_repo: Option<OperationBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationBlock {
    #[serde(default)]
    operations: Vec<Row>,
}

/// Which operation legs a repo key sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RepoLegs {
    repo: bool,
    reverse_repo: bool,
}

impl RepoLegs {
    fn from_key(key: &str) -> Result<Self, AppError> {
        let key = key.trim().to_uppercase();
        let repo = matches!(key.as_str(), "" | "ALL" | "REPO_TOTAL" | "REPO_TOTAL_ACCEPTED");
        let reverse_repo = matches!(
            key.as_str(),
            "ALL" | "RRP_TOTAL" | "RRP_TOTAL_ACCEPTED" | "REVERSE_REPO_TOTAL"
        );
        if !(repo || reverse_repo) {
            return Err(AppError::config(format!(
                "Unsupported repo key '{key}'. Supported: REPO_TOTAL, RRP_TOTAL, ALL."
            )));
        }
        Ok(Self { repo, reverse_repo })
    }
}

/// Rows whose `type` matches `key`, within `[start, end]`, sorted by date.
fn parse_reference_rates(rows: &[Row], key: &str, start: NaiveDate, end: NaiveDate) -> Vec<Observation> {
    let target = key.trim().to_uppercase();
    let mut by_date = BTreeMap::new();

    for row in rows {
        let row_type = row
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_uppercase();
        if row_type != target {
            continue;
        }
        let Some(date) = coerce_date(row, RATE_DATE_KEYS) else {
            continue;
        };
        if date < start || date > end {
            continue;
        }
        if let Some(value) = coerce_float(row, RATE_VALUE_KEYS) {
            by_date.insert(date, value);
        }
    }

    by_date
        .into_iter()
        .map(|(date, value)| Observation::new(date, value))
        .collect()
}

/// Accepted amounts summed per operation date across the selected legs.
fn parse_repo_operations(body: &RepoResponse, legs: RepoLegs, start: NaiveDate, end: NaiveDate) -> Vec<Observation> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    let mut accumulate = |block: Option<&OperationBlock>| {
        for row in block.map(|b| b.operations.as_slice()).unwrap_or_default() {
            let Some(date) = coerce_date(row, OP_DATE_KEYS) else {
                continue;
            };
            if date < start || date > end {
                continue;
            }
            if let Some(value) = coerce_float(row, OP_VALUE_KEYS) {
                *totals.entry(date).or_insert(0.0) += value;
            }
        }
    };

    if legs.repo {
        accumulate(body.repo.as_ref());
    }
    if legs.reverse_repo {
        accumulate(body.reverse_repo.as_ref());
    }

    totals
        .into_iter()
        .map(|(date, value)| Observation::new(date, value))
        .collect()
}

/// First key holding a parseable `YYYY-MM-DD` prefix.
fn coerce_date(row: &Row, keys: &[&str]) -> Option<NaiveDate> {
    keys.iter().find_map(|key| {
        let raw = row.get(*key)?.as_str()?;
        let prefix = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    })
}

/// First key holding a finite number or numeric string (commas allowed).
fn coerce_float(row: &Row, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if matches!(trimmed, "" | "." | "null" | "None") {
        return None;
    }
    let v = trimmed.replace(',', "").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn reference_rates_filter_type_and_window() {
        let body: RatesResponse = serde_json::from_str(
            r#"{"refRates": [
                {"effectiveDate": "2024-01-03", "type": "SOFR", "percentRate": 5.32},
                {"effectiveDate": "2024-01-02", "type": "SOFR", "percentRate": "5.31"},
                {"effectiveDate": "2024-01-02", "type": "EFFR", "percentRate": 5.33},
                {"effectiveDate": "2023-12-29", "type": "SOFR", "percentRate": 5.38},
                {"effectiveDate": "2024-01-04", "type": "sofr", "percentRate": "."}
            ]}"#,
        )
        .unwrap();

        let obs = parse_reference_rates(&body.ref_rates, "sofr", d(1, 1), d(1, 31));
        assert_eq!(obs, vec![Observation::new(d(1, 2), 5.31), Observation::new(d(1, 3), 5.32)]);
    }

    #[test]
    fn repo_totals_sum_per_date() {
        let body: RepoResponse = serde_json::from_str(
            r#"{
                "repo": {"operations": [
                    {"operationDate": "2024-03-01", "totalAmtAccepted": 1000},
                    {"operationDate": "2024-03-01", "totalAmtAccepted": "2,500"},
                    {"operationDate": "2024-03-04T00:00:00", "totalAmtAccepted": 0}
                ]},
                "reverseRepo": {"operations": [
                    {"operationDate": "2024-03-01", "totalAmtAccepted": 400000000000}
                ]}
            }"#,
        )
        .unwrap();

        let repo_only = parse_repo_operations(&body, RepoLegs::from_key("REPO_TOTAL").unwrap(), d(3, 1), d(3, 31));
        assert_eq!(
            repo_only,
            vec![Observation::new(d(3, 1), 3500.0), Observation::new(d(3, 4), 0.0)]
        );

        let both = parse_repo_operations(&body, RepoLegs::from_key("all").unwrap(), d(3, 1), d(3, 31));
        assert_eq!(both[0].value, Some(400_000_003_500.0));

        let rrp = parse_repo_operations(&body, RepoLegs::from_key("RRP_TOTAL").unwrap(), d(3, 2), d(3, 31));
        assert!(rrp.is_empty());
    }

    #[test]
    fn missing_blocks_are_empty() {
        let body: RepoResponse = serde_json::from_str("{}").unwrap();
        let obs = parse_repo_operations(&body, RepoLegs::from_key("ALL").unwrap(), d(1, 1), d(12, 31));
        assert!(obs.is_empty());
    }

    #[test]
    fn unknown_repo_key_is_a_config_error() {
        let err = RepoLegs::from_key("SWAPS").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn number_coercion() {
        assert_eq!(parse_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("null"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn date_coercion_falls_through_keys() {
        let row: Row = serde_json::from_str(r#"{"effectiveDate": "bad", "date": "2024-06-03"}"#).unwrap();
        assert_eq!(coerce_date(&row, RATE_DATE_KEYS), Some(d(6, 3)));
    }
}
