//! Conversion from named columns to numeric arrays.

use ndarray::Array2;

use super::{Dataset, DatasetError};

/// Extract the covariate matrix `v` and outcome matrix `y` from `data`.
///
/// Both results are row-major: `v` is `[n_rows, covariate.len()]` and `y`
/// is `[n_rows, outcome.len()]`.
pub fn convert_to_arrays<S: AsRef<str>, T: AsRef<str>>(
    data: &Dataset,
    covariate: &[S],
    outcome: &[T],
) -> Result<(Array2<f64>, Array2<f64>), DatasetError> {
    let v = data.select(covariate)?;
    let y = data.select(outcome)?;
    Ok((v, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn splits_covariates_and_outcome() {
        let ds = Dataset::builder()
            .add_column("x0", array![1.0, 2.0].view())
            .add_column("x1", array![3.0, 4.0].view())
            .add_column("y", array![5.0, 6.0].view())
            .build()
            .unwrap();

        let (v, y) = convert_to_arrays(&ds, &["x0", "x1"], &["y"]).unwrap();
        assert_eq!(v, array![[1.0, 3.0], [2.0, 4.0]]);
        assert_eq!(y, array![[5.0], [6.0]]);
    }

    #[test]
    fn unknown_outcome_is_reported() {
        let ds = Dataset::builder()
            .add_column("x0", array![1.0].view())
            .build()
            .unwrap();
        let err = convert_to_arrays(&ds, &["x0"], &["y"]).unwrap_err();
        assert_eq!(err, DatasetError::MissingColumn("y".into()));
    }
}
