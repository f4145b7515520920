//! Policy tree configuration with builder pattern.
//!
//! [`PolicyTreeConfig`] carries every hyperparameter of the policy tree and
//! is shared verbatim between [`PolicyInterpreter`](super::PolicyInterpreter)
//! and the tree it fits. The builder is generated by `bon`; `build()`
//! validates everything that does not depend on the training data.
//!
//! # Example
//!
//! ```
//! use policy_interp::model::{MaxFeatures, PolicyTreeConfig, SampleCount, Splitter};
//!
//! // All defaults
//! let config = PolicyTreeConfig::builder().build().unwrap();
//!
//! let config = PolicyTreeConfig::builder()
//!     .splitter(Splitter::Random)
//!     .max_depth(3)
//!     .min_samples_leaf(SampleCount::Fraction(0.05))
//!     .max_features(MaxFeatures::Sqrt)
//!     .random_state(7)
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::params::{Criterion, EffectReshape, MaxFeatures, SampleCount, Splitter};
use crate::logger::Verbosity;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A sample-count constraint is out of range.
    #[error("{field} must be {expected}, got {value:?}")]
    InvalidSampleCount {
        field: &'static str,
        value: SampleCount,
        expected: &'static str,
    },

    /// `min_weight_fraction_leaf` must be in [0, 0.5].
    #[error("min_weight_fraction_leaf must be in [0, 0.5], got {0}")]
    InvalidWeightFraction(f64),

    /// `max_features` is zero or a fraction outside (0, 1].
    #[error("invalid max_features {0:?}")]
    InvalidMaxFeatures(MaxFeatures),

    /// `max_leaf_nodes` must be at least 2.
    #[error("max_leaf_nodes must be >= 2, got {0}")]
    InvalidMaxLeafNodes(u32),

    /// A float parameter must be finite and non-negative.
    #[error("{field} must be a non-negative finite number, got {value}")]
    Negative { field: &'static str, value: f64 },

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// PolicyTreeConfig
// =============================================================================

/// Hyperparameters of a policy tree.
///
/// Most parameters mirror the usual CART decision-tree knobs. Optional
/// values mean "unbounded": `max_depth = None` grows until the sample
/// constraints stop it, `max_leaf_nodes = None` switches off best-first
/// growth.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct PolicyTreeConfig {
    /// Split criterion. Default: `PolicyReg`.
    #[builder(default)]
    pub criterion: Criterion,

    /// Split strategy. Default: `Best`.
    #[builder(default)]
    pub splitter: Splitter,

    /// Maximum depth of the tree. `None` means unbounded.
    pub max_depth: Option<u32>,

    /// Minimum samples required to split an internal node. Default: 2.
    #[builder(default = SampleCount::Absolute(2), into)]
    pub min_samples_split: SampleCount,

    /// Minimum samples required in each child of a split. Default: 1.
    #[builder(default = SampleCount::Absolute(1), into)]
    pub min_samples_leaf: SampleCount,

    /// Minimum fraction of the total sample weight required at a leaf.
    /// Default: 0.0.
    #[builder(default = 0.0)]
    pub min_weight_fraction_leaf: f64,

    /// Features considered per split. Default: `All`.
    #[builder(default)]
    pub max_features: MaxFeatures,

    /// Grow best-first with at most this many leaves. `None` means depth-first
    /// growth with no leaf limit.
    pub max_leaf_nodes: Option<u32>,

    /// A node is split only if the weighted objective gain is at least this
    /// value. Default: 0.0.
    #[builder(default = 0.0)]
    pub min_impurity_decrease: f64,

    /// Cost-complexity pruning strength. Stored but not used: pruning is not
    /// implemented. Default: 0.0.
    #[builder(default = 0.0)]
    pub ccp_alpha: f64,

    /// Seed for feature shuffling and random thresholds. Default: 2022.
    #[builder(default = 2022)]
    pub random_state: u64,

    /// Handling of 3-D effect arrays. Default: `Flatten`.
    #[builder(default)]
    pub effect_reshape: EffectReshape,

    /// Thread count: 0 = auto, 1 = sequential, >1 = exact count. Default: 0.
    #[builder(default = 0)]
    pub n_threads: usize,

    /// Fit logging level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: policy_tree_config_builder::IsComplete> PolicyTreeConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `min_samples_split` below 2 or a fraction outside (0, 1]
    /// - `min_samples_leaf` of 0 or a fraction outside (0, 1)
    /// - `min_weight_fraction_leaf` outside [0, 0.5]
    /// - `max_features` of 0 or a fraction outside (0, 1]
    /// - `max_leaf_nodes` below 2
    /// - negative `min_impurity_decrease` or `ccp_alpha`
    pub fn build(self) -> Result<PolicyTreeConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl PolicyTreeConfig {
    /// Parse a configuration from JSON, filling omitted fields with defaults.
    ///
    /// ```
    /// use policy_interp::model::{PolicyTreeConfig, Splitter};
    ///
    /// let config = PolicyTreeConfig::from_json(r#"{"splitter": "random", "max_depth": 2}"#).unwrap();
    /// assert_eq!(config.splitter, Splitter::Random);
    /// assert_eq!(config.max_depth, Some(2));
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate data-independent constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.min_samples_split {
            SampleCount::Absolute(k) if k < 2 => {
                return Err(ConfigError::InvalidSampleCount {
                    field: "min_samples_split",
                    value: self.min_samples_split,
                    expected: "an integer >= 2",
                })
            }
            SampleCount::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(ConfigError::InvalidSampleCount {
                    field: "min_samples_split",
                    value: self.min_samples_split,
                    expected: "a fraction in (0, 1]",
                })
            }
            _ => {}
        }

        match self.min_samples_leaf {
            SampleCount::Absolute(0) => {
                return Err(ConfigError::InvalidSampleCount {
                    field: "min_samples_leaf",
                    value: self.min_samples_leaf,
                    expected: "an integer >= 1",
                })
            }
            SampleCount::Fraction(f) if !(f > 0.0 && f < 1.0) => {
                return Err(ConfigError::InvalidSampleCount {
                    field: "min_samples_leaf",
                    value: self.min_samples_leaf,
                    expected: "a fraction in (0, 1)",
                })
            }
            _ => {}
        }

        if !(0.0..=0.5).contains(&self.min_weight_fraction_leaf) {
            return Err(ConfigError::InvalidWeightFraction(self.min_weight_fraction_leaf));
        }

        match self.max_features {
            MaxFeatures::Fixed(0) => return Err(ConfigError::InvalidMaxFeatures(self.max_features)),
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(ConfigError::InvalidMaxFeatures(self.max_features))
            }
            _ => {}
        }

        if let Some(n) = self.max_leaf_nodes {
            if n < 2 {
                return Err(ConfigError::InvalidMaxLeafNodes(n));
            }
        }

        for (field, value) in [
            ("min_impurity_decrease", self.min_impurity_decrease),
            ("ccp_alpha", self.ccp_alpha),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        Ok(())
    }
}

impl Default for PolicyTreeConfig {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PolicyTreeConfig::builder().build().unwrap();
        assert_eq!(config.criterion, Criterion::PolicyReg);
        assert_eq!(config.splitter, Splitter::Best);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.min_samples_split, SampleCount::Absolute(2));
        assert_eq!(config.min_samples_leaf, SampleCount::Absolute(1));
        assert_eq!(config.max_features, MaxFeatures::All);
        assert_eq!(config.max_leaf_nodes, None);
        assert_eq!(config.random_state, 2022);
        assert_eq!(config.effect_reshape, EffectReshape::Flatten);
        assert_eq!(config, PolicyTreeConfig::default());
    }

    #[test]
    fn min_samples_split_of_one_is_rejected() {
        let result = PolicyTreeConfig::builder().min_samples_split(1usize).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSampleCount { field: "min_samples_split", .. })
        ));
    }

    #[test]
    fn min_samples_split_fraction_bounds() {
        assert!(PolicyTreeConfig::builder().min_samples_split(1.0).build().is_ok());
        assert!(PolicyTreeConfig::builder().min_samples_split(0.0).build().is_err());
        assert!(PolicyTreeConfig::builder().min_samples_split(1.5).build().is_err());
    }

    #[test]
    fn min_samples_leaf_zero_is_rejected() {
        let result = PolicyTreeConfig::builder().min_samples_leaf(0usize).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSampleCount { field: "min_samples_leaf", .. })
        ));
        assert!(PolicyTreeConfig::builder().min_samples_leaf(1.0).build().is_err());
    }

    #[test]
    fn weight_fraction_bounds() {
        assert!(PolicyTreeConfig::builder().min_weight_fraction_leaf(0.5).build().is_ok());
        assert!(matches!(
            PolicyTreeConfig::builder().min_weight_fraction_leaf(0.6).build(),
            Err(ConfigError::InvalidWeightFraction(_))
        ));
    }

    #[test]
    fn max_features_validation() {
        assert!(matches!(
            PolicyTreeConfig::builder().max_features(MaxFeatures::Fixed(0)).build(),
            Err(ConfigError::InvalidMaxFeatures(_))
        ));
        assert!(PolicyTreeConfig::builder()
            .max_features(MaxFeatures::Fraction(1.2))
            .build()
            .is_err());
        assert!(PolicyTreeConfig::builder().max_features(MaxFeatures::Log2).build().is_ok());
    }

    #[test]
    fn max_leaf_nodes_must_allow_a_split() {
        assert!(matches!(
            PolicyTreeConfig::builder().max_leaf_nodes(1).build(),
            Err(ConfigError::InvalidMaxLeafNodes(1))
        ));
        assert!(PolicyTreeConfig::builder().max_leaf_nodes(2).build().is_ok());
    }

    #[test]
    fn negative_floats_are_rejected() {
        assert!(matches!(
            PolicyTreeConfig::builder().ccp_alpha(-1.0).build(),
            Err(ConfigError::Negative { field: "ccp_alpha", .. })
        ));
        assert!(matches!(
            PolicyTreeConfig::builder().min_impurity_decrease(f64::NAN).build(),
            Err(ConfigError::Negative { field: "min_impurity_decrease", .. })
        ));
    }

    #[test]
    fn from_json_fills_defaults_and_validates() {
        let config = PolicyTreeConfig::from_json(r#"{"max_leaf_nodes": 4}"#).unwrap();
        assert_eq!(config.max_leaf_nodes, Some(4));
        assert_eq!(config.random_state, 2022);

        let config = PolicyTreeConfig::from_json(r#"{"min_samples_leaf": {"fraction": 0.1}}"#).unwrap();
        assert_eq!(config.min_samples_leaf, SampleCount::Fraction(0.1));

        assert!(matches!(
            PolicyTreeConfig::from_json(r#"{"max_leaf_nodes": 1}"#),
            Err(ConfigError::InvalidMaxLeafNodes(1))
        ));
        assert!(matches!(
            PolicyTreeConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
