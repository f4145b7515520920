//! policy-interp: policy trees for interpreting causal-effect estimators.
//!
//! Given an estimator that predicts per-unit treatment effects, a policy
//! tree partitions the covariate space so that each leaf recommends the
//! treatment arm with the largest mean estimated effect.
//!
//! # Key Types
//!
//! - [`PolicyInterpreter`] - Fits a policy tree on an estimator and answers queries
//! - [`PolicyTreeConfig`] - Hyperparameters, with a validating builder
//! - [`PolicyTree`] - The fitted tree (structure-of-arrays)
//! - [`EffectEstimator`] - Contract for the estimator being interpreted
//! - [`Dataset`] - Named numeric columns
//!
//! # Logging
//!
//! Fitting emits `tracing` events under the `policy_interp` target, gated
//! by [`Verbosity`]. No subscriber is installed by the library.

pub mod data;
pub mod estimator;
pub mod logger;
pub mod model;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use model::{InterpretError, PolicyInterpreter, PolicyTreeConfig};

pub use estimator::{EffectEstimator, EstimateError, Quantity};

pub use repr::{DecisionPath, NodeId, PolicyTree};

pub use training::{FitError, PolicyTreeTrainer};

pub use data::{Dataset, DatasetBuilder, DatasetError};

pub use logger::Verbosity;

pub use utils::{run_with_threads, Parallelism};
