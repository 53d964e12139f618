//! Tail-probability transform.
//!
//! `p = sigmoid(steepness * (|z| - k))`, clamped to `[0, 1]`.
//!
//! This is a smooth, monotone proxy for "how unusual is this reading", not a
//! calibrated p-value: `k` shifts where the transition happens and the
//! steepness sets how abrupt it is.

use serde::{Deserialize, Serialize};

use crate::math::sigmoid;

/// Default tail sensitivity: `|z|` must exceed this to score above 0.5.
pub const DEFAULT_TAIL_K: f64 = 2.5;
/// Slope of the logistic transition.
pub const TAIL_STEEPNESS: f64 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailModel {
    pub k: f64,
    pub steepness: f64,
}

impl Default for TailModel {
    fn default() -> Self {
        Self {
            k: DEFAULT_TAIL_K,
            steepness: TAIL_STEEPNESS,
        }
    }
}

impl TailModel {
    pub fn with_k(k: f64) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    pub fn prob(&self, z: f64) -> f64 {
        if z.is_nan() {
            return 0.0;
        }
        let t = z.abs() - self.k;
        sigmoid(self.steepness * t).clamp(0.0, 1.0)
    }
}

/// Tail probability with the default steepness.
pub fn tail_prob(z: f64, k: f64) -> f64 {
    TailModel::with_k(k).prob(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_z_is_near_zero_for_default_k() {
        let p = tail_prob(0.0, DEFAULT_TAIL_K);
        assert!((p - sigmoid(-TAIL_STEEPNESS * DEFAULT_TAIL_K)).abs() < 1e-15);
        assert!(p < 0.01);
    }

    #[test]
    fn half_at_threshold() {
        assert!((tail_prob(2.5, 2.5) - 0.5).abs() < 1e-12);
        assert!((tail_prob(-2.5, 2.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn monotone_in_abs_z() {
        let k = 2.0;
        let zs: [f64; 9] = [0.0, 0.5, -1.0, 1.5, -2.0, 2.5, 3.0, -4.0, 8.0];
        for w in zs.windows(2) {
            let (z1, z2) = (w[0], w[1]);
            assert!(z1.abs() <= z2.abs());
            assert!(tail_prob(z1, k) <= tail_prob(z2, k), "{z1} vs {z2}");
        }
    }

    #[test]
    fn symmetric_in_sign() {
        assert_eq!(tail_prob(3.1, 2.5), tail_prob(-3.1, 2.5));
    }

    #[test]
    fn extreme_inputs_stay_in_unit_interval() {
        assert_eq!(tail_prob(f64::INFINITY, 2.5), 1.0);
        assert_eq!(tail_prob(1e12, 2.5), 1.0);
        assert_eq!(tail_prob(f64::NAN, 2.5), 0.0);
        let p = tail_prob(0.0, 50.0);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn higher_k_needs_larger_deviation() {
        assert!(tail_prob(3.0, 3.5) < tail_prob(3.0, 2.0));
    }

    #[test]
    fn steepness_is_overridable() {
        let soft = TailModel { k: 2.5, steepness: 0.5 };
        let hard = TailModel { k: 2.5, steepness: 5.0 };
        assert!(soft.prob(3.5) < hard.prob(3.5));
        assert!(soft.prob(1.5) > hard.prob(1.5));
    }
}
