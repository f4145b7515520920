//! Tabular input data.
//!
//! - [`Dataset`]: named numeric columns, column-major
//! - [`convert_to_arrays`]: covariate/outcome extraction into row-major arrays
//!
//! Missing values are not supported; the policy tree rejects non-finite
//! covariates and effects at fit time.

mod convert;
mod dataset;

pub use convert::convert_to_arrays;
pub use dataset::{Dataset, DatasetBuilder, DatasetError};
