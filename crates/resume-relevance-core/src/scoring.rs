//! Verdict tiers and weighted fusion of the hard and semantic scores.
//!
//! ```text
//! final = round(hard × w_hard + semantic × w_semantic, 2)
//!
//! final ≥ 70        → High
//! 40 ≤ final < 70   → Medium
//! otherwise         → Low
//! ```

use thiserror::Error;

use crate::models::Verdict;

/// Lower bound (inclusive) of the `High` tier.
pub const HIGH_THRESHOLD: f64 = 70.0;
/// Lower bound (inclusive) of the `Medium` tier.
pub const MEDIUM_THRESHOLD: f64 = 40.0;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Round to two decimal places. Exact halves go to the even digit.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Map a score to its verdict tier. Boundary values belong to the higher tier.
pub fn get_verdict(score: f64) -> Verdict {
    if score >= HIGH_THRESHOLD {
        Verdict::High
    } else if score >= MEDIUM_THRESHOLD {
        Verdict::Medium
    } else {
        Verdict::Low
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("{name} weight must be in [0.0, 1.0], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("hard and semantic weights must sum to 1.0, got {sum}")]
    NotNormalized { sum: f64 },
}

/// Fixed weights for combining the two signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    hard: f64,
    semantic: f64,
}

impl FusionWeights {
    pub const DEFAULT: FusionWeights = FusionWeights {
        hard: 0.6,
        semantic: 0.4,
    };

    /// Build a weight pair. Both weights must lie in `[0, 1]` and sum to 1.
    pub fn new(hard: f64, semantic: f64) -> Result<Self, WeightsError> {
        if !(0.0..=1.0).contains(&hard) {
            return Err(WeightsError::OutOfRange {
                name: "hard",
                value: hard,
            });
        }
        if !(0.0..=1.0).contains(&semantic) {
            return Err(WeightsError::OutOfRange {
                name: "semantic",
                value: semantic,
            });
        }
        let sum = hard + semantic;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::NotNormalized { sum });
        }
        Ok(Self { hard, semantic })
    }

    pub fn hard(&self) -> f64 {
        self.hard
    }

    pub fn semantic(&self) -> f64 {
        self.semantic
    }

    /// Weighted average of the two scores, rounded to 2 decimals.
    ///
    /// Inputs are not clamped: a negative semantic score (anti-correlated
    /// embeddings) pulls the result below the hard-score contribution.
    pub fn fuse(&self, hard_score: f64, semantic_score: f64) -> f64 {
        debug_assert!((self.hard + self.semantic - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
        round2(hard_score * self.hard + semantic_score * self.semantic)
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fuse with the default 0.6 / 0.4 weights.
pub fn final_score(hard_score: f64, semantic_score: f64) -> f64 {
    FusionWeights::DEFAULT.fuse(hard_score, semantic_score)
}

/// Fuse with explicit weights, validating them first.
pub fn final_score_weighted(
    hard_score: f64,
    semantic_score: f64,
    hard_weight: f64,
    semantic_weight: f64,
) -> Result<f64, WeightsError> {
    Ok(FusionWeights::new(hard_weight, semantic_weight)?.fuse(hard_score, semantic_score))
}
