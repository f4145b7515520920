//! Typed hyperparameter values for the policy tree.
//!
//! Each union-typed knob is a tagged enum that is resolved to a concrete
//! integer once the training data shape is known.

use serde::{Deserialize, Serialize};

// =============================================================================
// Criterion / Splitter
// =============================================================================

/// Split quality criterion.
///
/// `PolicyReg` maximizes `S = sum_i g_ik y_ik`, where `g_i` is the one-hot
/// arm assigned to the leaf containing unit `i` and `y_ik` the estimated
/// effect of arm `k` on unit `i`. Each leaf therefore picks the arm with the
/// largest summed effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    #[default]
    PolicyReg,
}

/// Strategy for choosing the split at each node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Splitter {
    /// Evaluate every threshold between consecutive distinct values.
    #[default]
    Best,
    /// Evaluate one uniformly drawn threshold per candidate feature.
    Random,
}

// =============================================================================
// SampleCount
// =============================================================================

/// A sample-count constraint given either absolutely or as a fraction of
/// the training rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleCount {
    Absolute(usize),
    /// Resolved as `ceil(fraction * n_samples)`.
    Fraction(f64),
}

impl SampleCount {
    /// Resolve against the number of training rows.
    pub fn resolve(self, n_samples: usize) -> usize {
        match self {
            SampleCount::Absolute(k) => k,
            SampleCount::Fraction(f) => ((f * n_samples as f64).ceil() as usize).max(1),
        }
    }
}

impl From<usize> for SampleCount {
    fn from(k: usize) -> Self {
        SampleCount::Absolute(k)
    }
}

impl From<f64> for SampleCount {
    fn from(f: f64) -> Self {
        SampleCount::Fraction(f)
    }
}

// =============================================================================
// MaxFeatures
// =============================================================================

/// Number of features considered when looking for the best split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature.
    #[default]
    All,
    /// Same as `All` for policy trees.
    Auto,
    Fixed(usize),
    /// `max(1, floor(fraction * n_features))`.
    Fraction(f64),
    /// `max(1, floor(sqrt(n_features)))`.
    Sqrt,
    /// `max(1, floor(log2(n_features)))`.
    Log2,
}

impl MaxFeatures {
    /// Resolve against the number of features.
    ///
    /// Returns `None` when a fixed count exceeds `n_features`.
    pub fn resolve(self, n_features: usize) -> Option<usize> {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::All | MaxFeatures::Auto => n_features,
            MaxFeatures::Fixed(k) if k > n_features => return None,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::Fraction(f) => ((f * n).floor() as usize).max(1),
            MaxFeatures::Sqrt => (n.sqrt().floor() as usize).max(1),
            MaxFeatures::Log2 => (n.log2().floor() as usize).max(1),
        };
        Some(k.min(n_features))
    }
}

// =============================================================================
// EffectReshape
// =============================================================================

/// What to do with a 3-D effect array `(n, k, m)` returned by an estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectReshape {
    /// Flatten to `(n, k * m)`, one column per (arm, outcome) pair.
    #[default]
    Flatten,
    /// Fail with an error.
    Reject,
}
