//! Policy tree training.
//!
//! - [`PolicyTreeTrainer`]: input validation and the fit entry point
//! - [`SplitCriterion`] / [`PolicyReg`]: node scoring
//! - [`GrowerParams`]: configuration resolved against the data shape

mod criterion;
mod grower;
mod params;
mod sampling;
mod splitter;
mod trainer;

pub use criterion::{NodeStats, PolicyReg, SplitCriterion};
pub use params::{GrowerParams, GrowthStrategy};
pub use splitter::FEATURE_THRESHOLD;
pub use trainer::{FitError, PolicyTreeTrainer};
