//! Policy tree trainer.
//!
//! Validates inputs, resolves the configuration against the data shape and
//! grows a tree on the configured thread pool.

use ndarray::ArrayView2;

use super::criterion::PolicyReg;
use super::grower::TreeGrower;
use super::params::GrowerParams;
use crate::logger::FitLogger;
use crate::model::{ConfigError, MaxFeatures, PolicyTreeConfig};
use crate::repr::PolicyTree;
use crate::utils::run_with_threads;

// =============================================================================
// FitError
// =============================================================================

/// Errors raised while fitting a policy tree.
#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error("cannot fit on zero rows")]
    EmptyData,

    #[error("covariate matrix has no columns")]
    NoFeatures,

    #[error("effect matrix has no treatment arms")]
    NoArms,

    #[error("effects have {got} rows, covariates have {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("{what} contain NaN or infinite values")]
    NonFiniteInput { what: &'static str },

    #[error("{got} feature names given for {expected} covariate columns")]
    FeatureNamesMismatch { expected: usize, got: usize },

    #[error("max_features {requested:?} is not valid for {n_features} features")]
    InvalidMaxFeatures { requested: MaxFeatures, n_features: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// PolicyTreeTrainer
// =============================================================================

/// Fits [`PolicyTree`]s with the `policy_reg` criterion.
///
/// ```
/// use ndarray::array;
/// use policy_interp::model::PolicyTreeConfig;
/// use policy_interp::training::PolicyTreeTrainer;
///
/// let v = array![[0.1], [0.2], [0.8], [0.9]];
/// let effects = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
/// let tree = PolicyTreeTrainer::new(PolicyTreeConfig::default())
///     .fit(v.view(), effects.view(), vec![])
///     .unwrap();
/// assert_eq!(tree.n_leaves(), 2);
/// assert_eq!(tree.feature_names(), ["x0"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyTreeTrainer {
    config: PolicyTreeConfig,
}

impl PolicyTreeTrainer {
    pub fn new(config: PolicyTreeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyTreeConfig {
        &self.config
    }

    /// Fit a tree on covariates `v` (`[n, f]`) and per-unit effects (`[n, k]`).
    ///
    /// Empty `feature_names` are replaced by `x0, x1, ...`.
    ///
    /// # Errors
    ///
    /// Returns [`FitError`] for an invalid configuration, empty or
    /// mismatched inputs, non-finite values, or a `max_features` that does
    /// not fit the number of covariates.
    pub fn fit(
        &self,
        v: ArrayView2<f64>,
        effects: ArrayView2<f64>,
        feature_names: Vec<String>,
    ) -> Result<PolicyTree, FitError> {
        self.config.validate()?;

        let (n_samples, n_features) = v.dim();
        let n_arms = effects.ncols();
        if n_samples == 0 {
            return Err(FitError::EmptyData);
        }
        if n_features == 0 {
            return Err(FitError::NoFeatures);
        }
        if n_arms == 0 {
            return Err(FitError::NoArms);
        }
        if effects.nrows() != n_samples {
            return Err(FitError::ShapeMismatch {
                expected: n_samples,
                got: effects.nrows(),
            });
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(FitError::NonFiniteInput { what: "covariates" });
        }
        if !effects.iter().all(|y| y.is_finite()) {
            return Err(FitError::NonFiniteInput { what: "effects" });
        }

        let feature_names = if feature_names.is_empty() {
            (0..n_features).map(|j| format!("x{j}")).collect()
        } else if feature_names.len() != n_features {
            return Err(FitError::FeatureNamesMismatch {
                expected: n_features,
                got: feature_names.len(),
            });
        } else {
            feature_names
        };

        let params = GrowerParams::resolve(&self.config, n_samples, n_features)?;
        let logger = FitLogger::new(self.config.verbosity);
        logger.fit_started(n_samples, n_features, n_arms);

        let (v, effects) = (v.view(), effects.view());
        let records = run_with_threads(self.config.n_threads, |parallelism| {
            TreeGrower::new(v, effects, &PolicyReg, &params, logger).grow(parallelism)
        });
        let tree = PolicyTree::from_records(records, n_arms, n_features, feature_names);

        logger.fit_finished(tree.n_leaves(), tree.depth());
        Ok(tree)
    }
}
