//! User-facing policy interpreter and its configuration.
//!
//! - [`PolicyInterpreter`]: fits a policy tree on an estimator's effects
//! - [`PolicyTreeConfig`]: hyperparameters, built with a validating builder

mod config;
mod interpreter;
mod params;

pub use config::{ConfigError, PolicyTreeConfig, PolicyTreeConfigBuilder};
pub use interpreter::{InterpretError, PolicyInterpreter};
pub use params::{Criterion, EffectReshape, MaxFeatures, SampleCount, Splitter};
