//! Causal estimator contract.
//!
//! The estimator itself is external: callers implement [`EffectEstimator`]
//! for whatever model produced the per-unit treatment effects. The policy
//! interpreter only reads its column declarations and calls
//! [`estimate`](EffectEstimator::estimate).

mod effects;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, DatasetError};

pub use effects::{flatten_effects, EffectShapeError};

/// Aggregate causal quantities an estimator may support.
///
/// Passing `None` for the quantity requests per-unit effects, which is what
/// the policy tree is fitted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Average treatment effect.
    Ate,
    /// Average treatment effect on the treated.
    Att,
    /// Average treatment effect on the controls.
    Atc,
}

/// Errors reported by an estimator.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("estimator is not fitted")]
    NotFitted,

    #[error("quantity {0:?} is not supported by this estimator")]
    UnsupportedQuantity(Quantity),

    #[error(transparent)]
    Data(#[from] DatasetError),

    #[error("estimation failed: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A fitted causal-effect estimator.
pub trait EffectEstimator {
    /// Estimator-specific options forwarded by
    /// [`PolicyInterpreter::fit_with_options`](crate::model::PolicyInterpreter::fit_with_options).
    type Options: Default;

    /// Covariate column names, if the estimator was fitted with covariates.
    fn covariate(&self) -> Option<&[String]>;

    /// Outcome column names.
    fn outcome(&self) -> &[String];

    fn is_fitted(&self) -> bool;

    /// Estimate causal effects on `data`.
    ///
    /// With `quantity = None` the result is per unit, with shape `(n,)`,
    /// `(n, k)` for `k` treatment arms, or `(n, k, m)` for `m` outcomes.
    fn estimate(
        &self,
        data: &Dataset,
        quantity: Option<Quantity>,
        options: &Self::Options,
    ) -> Result<ArrayD<f64>, EstimateError>;
}
