//! Risk bands for display.

use serde::{Deserialize, Serialize};

pub const HIGH_THRESHOLD: f64 = 0.80;
pub const ELEVATED_THRESHOLD: f64 = 0.50;

/// Ordered: `Normal < Elevated < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Normal,
    Elevated,
    High,
}

impl RiskBand {
    pub const ALL: [RiskBand; 3] = [RiskBand::Normal, RiskBand::Elevated, RiskBand::High];

    pub fn display_name(self) -> &'static str {
        match self {
            RiskBand::Normal => "Normal",
            RiskBand::Elevated => "Elevated",
            RiskBand::High => "High",
        }
    }

    /// Upper-case level used in alert lines.
    pub fn level(self) -> &'static str {
        match self {
            RiskBand::Normal => "NORMAL",
            RiskBand::Elevated => "ELEVATED",
            RiskBand::High => "HIGH",
        }
    }

    /// Lowest probability that maps to this band.
    pub fn lower_bound(self) -> f64 {
        match self {
            RiskBand::Normal => 0.0,
            RiskBand::Elevated => ELEVATED_THRESHOLD,
            RiskBand::High => HIGH_THRESHOLD,
        }
    }
}

/// Map a probability to its band. NaN falls through to `Normal`.
pub fn classify(p: f64) -> RiskBand {
    if p >= HIGH_THRESHOLD {
        RiskBand::High
    } else if p >= ELEVATED_THRESHOLD {
        RiskBand::Elevated
    } else {
        RiskBand::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(classify(0.80), RiskBand::High);
        assert_eq!(classify(0.7999), RiskBand::Elevated);
        assert_eq!(classify(0.50), RiskBand::Elevated);
        assert_eq!(classify(0.4999), RiskBand::Normal);
    }

    #[test]
    fn covers_unit_interval() {
        assert_eq!(classify(0.0), RiskBand::Normal);
        assert_eq!(classify(1.0), RiskBand::High);
        assert_eq!(classify(f64::NAN), RiskBand::Normal);
    }

    #[test]
    fn bands_are_ordered() {
        assert!(RiskBand::Normal < RiskBand::Elevated);
        assert!(RiskBand::Elevated < RiskBand::High);
        for band in RiskBand::ALL {
            assert_eq!(classify(band.lower_bound()), band);
        }
    }
}
