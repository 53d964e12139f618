//! Reporting utilities: client-side alert state and formatted terminal output.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::ScorePoint;
use crate::score::RiskBand;

pub mod format;

pub use format::*;

/// Alert state for the headline reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub date: NaiveDate,
    pub band: RiskBand,
    pub message: String,
}

/// `Elevated` and `High` readings raise an alert; `Normal` does not.
pub fn alert_for(point: &ScorePoint) -> Option<Alert> {
    let band = point.band();
    if band == RiskBand::Normal {
        return None;
    }

    let mut message = format!(
        "{} funding stress on {}: p_stress={:.2} (spread p={:.2}, z={:+.2}",
        band.level(),
        point.date,
        point.p_stress,
        point.p_spread,
        point.z_spread,
    );
    match point.z_repo {
        Some(z) => message.push_str(&format!("; repo p={:.2}, z={z:+.2})", point.p_repo)),
        None => message.push_str("; no repo signal)"),
    }

    Some(Alert {
        date: point.date,
        band,
        message,
    })
}
