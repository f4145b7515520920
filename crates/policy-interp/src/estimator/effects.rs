//! Normalization of estimator output to the 2-D effect matrix.

use ndarray::{Array2, ArrayD, Ix1, Ix2};

use crate::model::EffectReshape;

/// Errors from [`flatten_effects`].
#[derive(Debug, thiserror::Error)]
pub enum EffectShapeError {
    /// The array is not 1-, 2- or 3-dimensional.
    #[error("effect array must have 1 to 3 dimensions, got {0}")]
    UnsupportedRank(usize),

    /// A 3-D array was returned while [`EffectReshape::Reject`] is configured.
    #[error("effect array has shape {shape:?}; 3-D effects are rejected by configuration")]
    ThreeDimensional { shape: Vec<usize> },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// Normalize an effect array to `[n_units, n_columns]`.
///
/// - `(n,)` becomes `(n, 1)`
/// - `(n, k)` is returned unchanged
/// - `(n, k, m)` becomes `(n, k * m)` under [`EffectReshape::Flatten`], with
///   column `a * m + o` holding arm `a`, outcome `o`; it is an error under
///   [`EffectReshape::Reject`]
pub fn flatten_effects(
    effects: ArrayD<f64>,
    mode: EffectReshape,
) -> Result<Array2<f64>, EffectShapeError> {
    match effects.ndim() {
        1 => {
            let col = effects.into_dimensionality::<Ix1>()?;
            let n = col.len();
            Ok(col.into_shape_with_order((n, 1))?)
        }
        2 => Ok(effects.into_dimensionality::<Ix2>()?),
        3 => match mode {
            EffectReshape::Reject => Err(EffectShapeError::ThreeDimensional {
                shape: effects.shape().to_vec(),
            }),
            EffectReshape::Flatten => {
                let n = effects.shape()[0];
                let width = effects.shape()[1] * effects.shape()[2];
                let standard = effects.as_standard_layout().into_owned();
                Ok(standard.into_shape_with_order((n, width))?)
            }
        },
        rank => Err(EffectShapeError::UnsupportedRank(rank)),
    }
}
