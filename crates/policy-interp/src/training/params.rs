//! Grower parameters resolved against the training data shape.

use super::FitError;
use crate::model::{PolicyTreeConfig, Splitter};

/// Tree growth strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrowthStrategy {
    /// Expand nodes depth-first with no leaf limit.
    #[default]
    DepthFirst,
    /// Expand the node with the largest gain first, up to `max_leaves` leaves.
    BestFirst { max_leaves: u32 },
}

/// Concrete limits used while growing one tree.
#[derive(Clone, Debug)]
pub struct GrowerParams {
    pub growth_strategy: GrowthStrategy,
    pub splitter: Splitter,
    pub max_depth: u32,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub min_weight_leaf: f64,
    pub max_features: usize,
    pub min_impurity_decrease: f64,
    pub seed: u64,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self {
            growth_strategy: GrowthStrategy::default(),
            splitter: Splitter::Best,
            max_depth: u32::MAX,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_weight_leaf: 0.0,
            max_features: usize::MAX,
            min_impurity_decrease: 0.0,
            seed: 2022,
        }
    }
}

impl GrowerParams {
    /// Resolve `config` for `n_samples` rows and `n_features` covariates.
    pub fn resolve(config: &PolicyTreeConfig, n_samples: usize, n_features: usize) -> Result<Self, FitError> {
        let min_samples_leaf = config.min_samples_leaf.resolve(n_samples);
        let min_samples_split = config
            .min_samples_split
            .resolve(n_samples)
            .max(2)
            .max(min_samples_leaf.saturating_mul(2));
        let max_features = config
            .max_features
            .resolve(n_features)
            .ok_or(FitError::InvalidMaxFeatures {
                requested: config.max_features,
                n_features,
            })?;

        Ok(Self {
            growth_strategy: match config.max_leaf_nodes {
                Some(max_leaves) => GrowthStrategy::BestFirst { max_leaves },
                None => GrowthStrategy::DepthFirst,
            },
            splitter: config.splitter,
            max_depth: config.max_depth.unwrap_or(u32::MAX),
            min_samples_split,
            min_samples_leaf,
            min_weight_leaf: config.min_weight_fraction_leaf * n_samples as f64,
            max_features,
            min_impurity_decrease: config.min_impurity_decrease,
            seed: config.random_state,
        })
    }
}
