//! Named-column dataset container and builder.

use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView1};

/// Errors from dataset construction and column lookup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// No columns were provided.
    #[error("dataset must have at least one column")]
    EmptyColumns,

    /// The same column name was added twice.
    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),

    /// A column has a different number of rows than the first one.
    #[error("column `{column}` has {got} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    /// A requested column does not exist.
    #[error("column `{0}` not found in dataset")]
    MissingColumn(String),
}

/// In-memory table of named numeric columns.
///
/// # Storage Layout
///
/// Columns are stored **column-major**: `[n_columns, n_rows]`, each column
/// contiguous in memory. [`Dataset::select`] returns row-major matrices
/// `[n_rows, n_selected]`, which is what the policy tree consumes.
///
/// # Example
///
/// ```
/// use policy_interp::data::Dataset;
/// use ndarray::array;
///
/// let ds = Dataset::builder()
///     .add_column("age", array![25.0, 30.0, 35.0].view())
///     .add_column("income", array![1.0, 2.0, 3.0].view())
///     .build()
///     .unwrap();
///
/// assert_eq!(ds.n_rows(), 3);
/// let x = ds.select(&["income"]).unwrap();
/// assert_eq!(x.shape(), &[3, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `[n_columns, n_rows]`.
    columns: Array2<f64>,
    names: Vec<String>,
    name_index: HashMap<String, usize>,
}

impl Dataset {
    /// Create a builder.
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::new()
    }

    /// Create a dataset from `(name, values)` pairs.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, DatasetError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Array1<f64>)>,
    {
        columns
            .into_iter()
            .fold(DatasetBuilder::new(), |b, (name, values)| b.add_owned(name, values))
            .build()
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.columns.ncols()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.nrows()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// View a single column by name.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|i| self.columns.row(i))
    }

    /// Gather the named columns into a row-major `[n_rows, names.len()]` matrix.
    ///
    /// # Errors
    ///
    /// [`DatasetError::MissingColumn`] for the first unknown name.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f64>, DatasetError> {
        let indices = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.column_index(n)
                    .ok_or_else(|| DatasetError::MissingColumn(n.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Array2::zeros((self.n_rows(), indices.len()));
        for (j, &idx) in indices.iter().enumerate() {
            out.column_mut(j).assign(&self.columns.row(idx));
        }
        Ok(out)
    }
}

/// Builder for [`Dataset`].
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    columns: Vec<(String, Array1<f64>)>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a numeric column.
    pub fn add_column(self, name: impl Into<String>, values: ArrayView1<f64>) -> Self {
        self.add_owned(name, values.to_owned())
    }

    fn add_owned(mut self, name: impl Into<String>, values: Array1<f64>) -> Self {
        self.columns.push((name.into(), values));
        self
    }

    /// Build the dataset.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::EmptyColumns`] if no columns were added
    /// - [`DatasetError::DuplicateColumn`] on repeated names
    /// - [`DatasetError::ShapeMismatch`] on inconsistent row counts
    pub fn build(self) -> Result<Dataset, DatasetError> {
        let n_rows = match self.columns.first() {
            Some((_, values)) => values.len(),
            None => return Err(DatasetError::EmptyColumns),
        };

        let mut name_index = HashMap::with_capacity(self.columns.len());
        for (i, (name, values)) in self.columns.iter().enumerate() {
            if values.len() != n_rows {
                return Err(DatasetError::ShapeMismatch {
                    column: name.clone(),
                    expected: n_rows,
                    got: values.len(),
                });
            }
            if name_index.insert(name.clone(), i).is_some() {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
        }

        let mut columns = Array2::zeros((self.columns.len(), n_rows));
        let mut names = Vec::with_capacity(self.columns.len());
        for (i, (name, values)) in self.columns.into_iter().enumerate() {
            columns.row_mut(i).assign(&values);
            names.push(name);
        }

        Ok(Dataset {
            columns,
            names,
            name_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Dataset {
        Dataset::builder()
            .add_column("a", array![1.0, 2.0, 3.0].view())
            .add_column("b", array![4.0, 5.0, 6.0].view())
            .add_column("y", array![0.0, 1.0, 0.0].view())
            .build()
            .unwrap()
    }

    #[test]
    fn select_is_row_major() {
        let ds = sample();
        let x = ds.select(&["b", "a"]).unwrap();
        assert_eq!(x, array![[4.0, 1.0], [5.0, 2.0], [6.0, 3.0]]);
    }

    #[test]
    fn select_missing_column() {
        let ds = sample();
        assert_eq!(
            ds.select(&["a", "nope"]),
            Err(DatasetError::MissingColumn("nope".into()))
        );
    }

    #[test]
    fn empty_builder_fails() {
        assert_eq!(Dataset::builder().build().unwrap_err(), DatasetError::EmptyColumns);
    }

    #[test]
    fn duplicate_column_fails() {
        let err = Dataset::builder()
            .add_column("a", array![1.0].view())
            .add_column("a", array![2.0].view())
            .build()
            .unwrap_err();
        assert_eq!(err, DatasetError::DuplicateColumn("a".into()));
    }

    #[test]
    fn row_count_mismatch_fails() {
        let err = Dataset::builder()
            .add_column("a", array![1.0, 2.0].view())
            .add_column("b", array![2.0].view())
            .build()
            .unwrap_err();
        assert!(matches!(err, DatasetError::ShapeMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn from_columns_matches_builder() {
        let ds = Dataset::from_columns([("x", array![1.0, 2.0]), ("z", array![3.0, 4.0])]).unwrap();
        assert_eq!(ds.column_names(), &["x".to_string(), "z".to_string()]);
        assert_eq!(ds.select(&["x", "z"]).unwrap(), array![[1.0, 3.0], [2.0, 4.0]]);
    }
}
