//! High-level policy interpreter.
//!
//! [`PolicyInterpreter`] fits a [`PolicyTree`] on the per-unit effects of an
//! already fitted [`EffectEstimator`] and answers policy queries from it.

use ndarray::{Array1, Array2, ArrayView2};

use super::PolicyTreeConfig;
use crate::data::{convert_to_arrays, Dataset, DatasetError};
use crate::estimator::{flatten_effects, EffectEstimator, EffectShapeError, EstimateError};
use crate::logger::FitLogger;
use crate::repr::{DecisionPath, NodeId, PolicyTree, QueryError};
use crate::training::{FitError, PolicyTreeTrainer};
use crate::utils::{run_with_threads, Parallelism};

// =============================================================================
// InterpretError
// =============================================================================

/// Errors from [`PolicyInterpreter`].
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("estimator has no covariates to build a policy tree on")]
    MissingCovariate,

    #[error("estimator must be fitted before interpreting it")]
    EstimatorNotFitted,

    #[error("outcome must be a single column, got {n_columns}")]
    OutcomeNotUnivariate { n_columns: usize },

    #[error("interpreter is not fitted")]
    NotFitted,

    #[error("{operation} is not implemented")]
    NotImplemented { operation: &'static str },

    #[error(transparent)]
    Data(#[from] DatasetError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),

    #[error(transparent)]
    Effects(#[from] EffectShapeError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

// =============================================================================
// PolicyInterpreter
// =============================================================================

#[derive(Debug, Clone)]
struct FittedState {
    /// Training covariates, `[n, f]`.
    v: Array2<f64>,
    covariate: Vec<String>,
    tree: PolicyTree,
}

/// Interprets a causal estimator by fitting a policy tree on its effects.
///
/// Each leaf of the tree recommends the treatment arm with the largest
/// mean estimated effect among the training units it holds.
///
/// ```
/// use ndarray::{array, ArrayD, IxDyn};
/// use policy_interp::data::Dataset;
/// use policy_interp::model::PolicyInterpreter;
/// use policy_interp::testing::StaticEstimator;
///
/// let data = Dataset::from_columns([
///     ("x", array![0.1, 0.2, 0.8, 0.9]),
///     ("y", array![1.0, 0.0, 1.0, 0.0]),
/// ])
/// .unwrap();
/// let effects = ArrayD::from_shape_vec(IxDyn(&[4, 2]), vec![1., 0., 1., 0., 0., 1., 0., 1.]).unwrap();
/// let est = StaticEstimator::new(&["x"], &["y"], effects);
///
/// let mut interpreter = PolicyInterpreter::default();
/// interpreter.fit(&data, &est).unwrap();
/// let arms = interpreter.predict_ind(array![[0.0], [1.0]].view()).unwrap();
/// assert_eq!(arms.to_vec(), vec![0, 1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyInterpreter {
    config: PolicyTreeConfig,
    fitted: Option<FittedState>,
}

impl PolicyInterpreter {
    pub fn new(config: PolicyTreeConfig) -> Self {
        Self { config, fitted: None }
    }

    pub fn config(&self) -> &PolicyTreeConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fit with the estimator's default options.
    pub fn fit<E: EffectEstimator>(&mut self, data: &Dataset, est_model: &E) -> Result<&mut Self, InterpretError> {
        self.fit_with_options(data, est_model, &E::Options::default())
    }

    /// Fit a policy tree on the per-unit effects `est_model` estimates for `data`.
    ///
    /// On error the previously fitted state, if any, is kept.
    ///
    /// # Errors
    ///
    /// - [`InterpretError::MissingCovariate`] if the estimator has no covariates
    /// - [`InterpretError::EstimatorNotFitted`] if the estimator is not fitted
    /// - [`InterpretError::OutcomeNotUnivariate`] for a multi-column outcome
    /// - wrapped data, estimation, effect-shape and fit errors
    pub fn fit_with_options<E: EffectEstimator>(
        &mut self,
        data: &Dataset,
        est_model: &E,
        options: &E::Options,
    ) -> Result<&mut Self, InterpretError> {
        let covariate = est_model.covariate().ok_or(InterpretError::MissingCovariate)?;
        if !est_model.is_fitted() {
            return Err(InterpretError::EstimatorNotFitted);
        }

        let (v, y) = convert_to_arrays(data, covariate, est_model.outcome())?;
        if y.ncols() != 1 {
            return Err(InterpretError::OutcomeNotUnivariate { n_columns: y.ncols() });
        }

        let effects = est_model.estimate(data, None, options)?;
        let raw_shape = effects.shape().to_vec();
        let effects = flatten_effects(effects, self.config.effect_reshape)?;
        if raw_shape.len() == 3 {
            FitLogger::new(self.config.verbosity).warn(&format!(
                "effect array has shape {raw_shape:?}; fitting on arm-outcome pairs flattened into {} columns",
                effects.ncols(),
            ));
        }

        let covariate = covariate.to_vec();
        let tree = PolicyTreeTrainer::new(self.config.clone()).fit(v.view(), effects.view(), covariate.clone())?;

        self.fitted = Some(FittedState { v, covariate, tree });
        Ok(self)
    }

    /// Textual interpretation of the fitted policy.
    ///
    /// Not implemented yet: after a successful fit this always returns
    /// [`InterpretError::NotImplemented`].
    pub fn interpret(&self) -> Result<String, InterpretError> {
        self.state()?;
        Err(InterpretError::NotImplemented { operation: "interpret" })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Leaf node id reached by each row of `v`.
    pub fn apply(&self, v: ArrayView2<f64>) -> Result<Array1<NodeId>, InterpretError> {
        let tree = self.tree()?;
        Ok(self.run(|p| tree.apply(v, p))?)
    }

    /// Nodes visited by each row of `v`.
    pub fn decision_path(&self, v: ArrayView2<f64>) -> Result<DecisionPath, InterpretError> {
        let tree = self.tree()?;
        Ok(self.run(|p| tree.decision_path(v, p))?)
    }

    /// Index of the recommended treatment arm for each row of `v`.
    pub fn predict_ind(&self, v: ArrayView2<f64>) -> Result<Array1<usize>, InterpretError> {
        let tree = self.tree()?;
        Ok(self.run(|p| tree.predict_ind(v, p))?)
    }

    /// Mean effect of the recommended arm for each row of `v`.
    pub fn predict_opt_effect(&self, v: ArrayView2<f64>) -> Result<Array1<f64>, InterpretError> {
        let tree = self.tree()?;
        Ok(self.run(|p| tree.predict_opt_effect(v, p))?)
    }

    /// Leaf mean effect per arm, `[n, n_arms]`.
    ///
    /// With `data`, rows are taken from its covariate columns; without,
    /// from the training covariates.
    pub fn estimate(&self, data: Option<&Dataset>) -> Result<Array2<f64>, InterpretError> {
        let state = self.state()?;
        let selected;
        let v = match data {
            Some(data) => {
                selected = data.select(&state.covariate)?;
                selected.view()
            }
            None => state.v.view(),
        };
        Ok(self.run(|p| state.tree.leaf_values(v, p))?)
    }

    // =========================================================================
    // Fitted state
    // =========================================================================

    pub fn tree(&self) -> Result<&PolicyTree, InterpretError> {
        Ok(&self.state()?.tree)
    }

    /// Training covariates.
    pub fn v(&self) -> Result<ArrayView2<'_, f64>, InterpretError> {
        Ok(self.state()?.v.view())
    }

    /// Covariate names the tree was fitted on.
    pub fn covariate(&self) -> Result<&[String], InterpretError> {
        Ok(self.state()?.covariate.as_slice())
    }

    fn state(&self) -> Result<&FittedState, InterpretError> {
        self.fitted.as_ref().ok_or(InterpretError::NotFitted)
    }

    fn run<T: Send>(&self, f: impl FnOnce(Parallelism) -> T + Send) -> T {
        run_with_threads(self.config.n_threads, f)
    }
}
