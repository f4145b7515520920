//! Test helpers: in-memory estimators and synthetic data.
//!
//! Public so integration tests and doc examples can use them.

mod data;
mod estimators;

pub use data::{random_covariates, random_dataset};
pub use estimators::{FnEstimator, StaticEstimator};
