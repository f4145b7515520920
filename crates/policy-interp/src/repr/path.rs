//! Decision paths in compressed sparse row form.

use ndarray::Array2;

use super::NodeId;

/// Nodes visited by each row on its way from the root to its leaf.
///
/// Stored CSR-style: the nodes of row `i` are
/// `indices[indptr[i]..indptr[i + 1]]`, ordered root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionPath {
    indptr: Vec<usize>,
    indices: Vec<NodeId>,
    n_nodes: usize,
}

impl DecisionPath {
    pub(crate) fn from_paths(paths: Vec<Vec<NodeId>>, n_nodes: usize) -> Self {
        let mut indptr = Vec::with_capacity(paths.len() + 1);
        indptr.push(0);
        let mut indices = Vec::with_capacity(paths.iter().map(Vec::len).sum());
        for path in paths {
            indices.extend_from_slice(&path);
            indptr.push(indices.len());
        }
        Self {
            indptr,
            indices,
            n_nodes,
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn indices(&self) -> &[NodeId] {
        &self.indices
    }

    /// Nodes visited by `row`, root first.
    pub fn nodes(&self, row: usize) -> &[NodeId] {
        &self.indices[self.indptr[row]..self.indptr[row + 1]]
    }

    pub fn contains(&self, row: usize, node: NodeId) -> bool {
        self.nodes(row).contains(&node)
    }

    /// Dense `[n_rows, n_nodes]` indicator matrix.
    pub fn to_dense(&self) -> Array2<bool> {
        let mut dense = Array2::from_elem((self.n_rows(), self.n_nodes), false);
        for row in 0..self.n_rows() {
            for &node in self.nodes(row) {
                dense[[row, node as usize]] = true;
            }
        }
        dense
    }
}
