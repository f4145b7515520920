//! In-memory [`EffectEstimator`]s.

use ndarray::{Array2, ArrayD};

use crate::data::Dataset;
use crate::estimator::{EffectEstimator, EstimateError, Quantity};

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// StaticEstimator
// =============================================================================

/// Returns a fixed effect array regardless of the data passed in.
#[derive(Debug, Clone)]
pub struct StaticEstimator {
    covariate: Option<Vec<String>>,
    outcome: Vec<String>,
    effects: ArrayD<f64>,
    fitted: bool,
}

impl StaticEstimator {
    pub fn new(covariate: &[&str], outcome: &[&str], effects: ArrayD<f64>) -> Self {
        Self {
            covariate: Some(names(covariate)),
            outcome: names(outcome),
            effects,
            fitted: true,
        }
    }

    /// Same estimator, fitted without covariates.
    pub fn without_covariate(mut self) -> Self {
        self.covariate = None;
        self
    }

    /// Same estimator, reported as not fitted.
    pub fn unfitted(mut self) -> Self {
        self.fitted = false;
        self
    }
}

impl EffectEstimator for StaticEstimator {
    type Options = ();

    fn covariate(&self) -> Option<&[String]> {
        self.covariate.as_deref()
    }

    fn outcome(&self) -> &[String] {
        &self.outcome
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn estimate(
        &self,
        data: &Dataset,
        quantity: Option<Quantity>,
        _options: &(),
    ) -> Result<ArrayD<f64>, EstimateError> {
        if !self.fitted {
            return Err(EstimateError::NotFitted);
        }
        if let Some(q) = quantity {
            return Err(EstimateError::UnsupportedQuantity(q));
        }
        if self.effects.shape().first() != Some(&data.n_rows()) {
            return Err(EstimateError::Other(
                format!("effects cover {:?} rows, data has {}", self.effects.shape().first(), data.n_rows()).into(),
            ));
        }
        Ok(self.effects.clone())
    }
}

// =============================================================================
// FnEstimator
// =============================================================================

/// Computes effects from the covariate rows with a closure.
///
/// The closure receives the `[n, f]` covariate matrix in declared column
/// order and returns per-unit effects of shape `(n,)`, `(n, k)` or `(n, k, m)`.
pub struct FnEstimator<F> {
    covariate: Vec<String>,
    outcome: Vec<String>,
    f: F,
}

impl<F> FnEstimator<F>
where
    F: Fn(&Array2<f64>) -> ArrayD<f64>,
{
    pub fn new(covariate: &[&str], outcome: &[&str], f: F) -> Self {
        Self {
            covariate: names(covariate),
            outcome: names(outcome),
            f,
        }
    }
}

impl<F> EffectEstimator for FnEstimator<F>
where
    F: Fn(&Array2<f64>) -> ArrayD<f64>,
{
    type Options = ();

    fn covariate(&self) -> Option<&[String]> {
        Some(self.covariate.as_slice())
    }

    fn outcome(&self) -> &[String] {
        &self.outcome
    }

    fn is_fitted(&self) -> bool {
        true
    }

    fn estimate(
        &self,
        data: &Dataset,
        quantity: Option<Quantity>,
        _options: &(),
    ) -> Result<ArrayD<f64>, EstimateError> {
        if let Some(q) = quantity {
            return Err(EstimateError::UnsupportedQuantity(q));
        }
        let v = data.select(&self.covariate)?;
        Ok((self.f)(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    #[test]
    fn static_estimator_checks_rows() {
        let est = StaticEstimator::new(&["x"], &["y"], ArrayD::zeros(IxDyn(&[3, 2])));
        let data = Dataset::from_columns([("x", array![1.0, 2.0])]).unwrap();
        assert!(matches!(est.estimate(&data, None, &()), Err(EstimateError::Other(_))));
        assert!(matches!(
            est.estimate(&data, Some(Quantity::Ate), &()),
            Err(EstimateError::UnsupportedQuantity(Quantity::Ate))
        ));
    }

    #[test]
    fn fn_estimator_sees_covariates_in_order() {
        let est = FnEstimator::new(&["b", "a"], &["y"], |v: &Array2<f64>| v.column(0).to_owned().into_dyn());
        let data = Dataset::from_columns([("a", array![1.0, 2.0]), ("b", array![5.0, 6.0])]).unwrap();
        let effects = est.estimate(&data, None, &()).unwrap();
        assert_eq!(effects.iter().copied().collect::<Vec<_>>(), vec![5.0, 6.0]);
    }
}
