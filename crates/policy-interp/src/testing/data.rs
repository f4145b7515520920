use ndarray::Array2;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{Dataset, DatasetError};

/// Uniform covariates in `[min, max)`, `[rows, cols]`.
pub fn random_covariates(rows: usize, cols: usize, seed: u64, min: f64, max: f64) -> Array2<f64> {
    assert!(max > min);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    Array2::from_shape_simple_fn((rows, cols), || rng.gen_range(min..max))
}

/// A dataset of uniform `[0, 1)` columns, one per name.
pub fn random_dataset(rows: usize, names: &[&str], seed: u64) -> Result<Dataset, DatasetError> {
    let values = random_covariates(rows, names.len(), seed, 0.0, 1.0);
    names
        .iter()
        .zip(values.columns())
        .fold(Dataset::builder(), |builder, (name, column)| builder.add_column(*name, column))
        .build()
}
