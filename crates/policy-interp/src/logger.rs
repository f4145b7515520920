//! Fit logging gated by [`Verbosity`].
//!
//! Events go through `tracing`; installing a subscriber is left to the
//! application.

use serde::{Deserialize, Serialize};

/// Verbosity level for fitting output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Warnings only.
    Warning,
    /// Fit start and summary.
    Info,
    /// Every split.
    Debug,
}

/// Logger handed through a single fit.
#[derive(Clone, Copy, Debug)]
pub struct FitLogger {
    verbosity: Verbosity,
}

impl FitLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Silent && self.verbosity >= level
    }

    pub fn warn(&self, message: &str) {
        if self.enabled(Verbosity::Warning) {
            tracing::warn!(target: "policy_interp", "{message}");
        }
    }

    pub fn fit_started(&self, n_samples: usize, n_features: usize, n_arms: usize) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                target: "policy_interp",
                n_samples,
                n_features,
                n_arms,
                "fitting policy tree"
            );
        }
    }

    pub fn fit_finished(&self, n_leaves: usize, depth: u32) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(target: "policy_interp", n_leaves, depth, "policy tree fitted");
        }
    }

    pub fn split(&self, node: u32, feature: usize, threshold: f64, improvement: f64) {
        if self.enabled(Verbosity::Debug) {
            tracing::debug!(
                target: "policy_interp",
                node,
                feature,
                threshold,
                improvement,
                "split"
            );
        }
    }
}
