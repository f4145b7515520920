//! Fitted policy tree (SoA) and its queries.
//!
//! This module provides:
//! - [`PolicyTree`]: immutable structure-of-arrays storage of a fitted tree
//! - [`QueryError`]: input errors for batch queries
//! - [`TreeValidationError`]: structural validation errors
//! - [`PersistError`]: JSON import/export errors

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::path::DecisionPath;
use super::NodeId;
use crate::model::PolicyTreeConfig;
use crate::training::{FitError, PolicyTreeTrainer};
use crate::utils::Parallelism;

// ============================================================================
// Errors
// ============================================================================

/// Errors from querying a fitted tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("expected {expected} covariate columns, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },
}

/// Structural validation errors for [`PolicyTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    EmptyTree,

    #[error("node arrays have inconsistent lengths")]
    LenMismatch,

    #[error("node values have no arm columns")]
    NoArms,

    #[error("{got} feature names for {n_features} features")]
    FeatureNamesMismatch { n_features: usize, got: usize },

    #[error("node {node}: {side} child {child} out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },

    #[error("node {node} references itself")]
    SelfLoop { node: NodeId },

    #[error("node {node} reached more than once")]
    DuplicateVisit { node: NodeId },

    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },

    #[error("node {node} splits on feature {feature} but the tree has {n_features} features")]
    FeatureOutOfBounds {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },
}

/// Errors from JSON import/export.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid tree: {0}")]
    Invalid(#[from] TreeValidationError),
}

// ============================================================================
// NodeRecord
// ============================================================================

/// One node as produced by the grower.
#[derive(Debug, Clone)]
pub(crate) struct NodeRecord {
    pub split_feature: u32,
    pub threshold: f64,
    pub left: NodeId,
    pub right: NodeId,
    pub is_leaf: bool,
    pub depth: u32,
    pub n_samples: u32,
    pub weighted_n_samples: f64,
    pub objective: f64,
    /// Weighted objective gain of the split, 0 for leaves.
    pub gain: f64,
    /// Mean effect per arm.
    pub value: Vec<f64>,
}

// ============================================================================
// PolicyTree
// ============================================================================

/// A fitted policy tree.
///
/// Nodes are stored in flat arrays indexed by [`NodeId`] (0 = root). A row
/// goes left at a split when `x[feature] <= threshold`. Every node carries
/// the mean effect of each treatment arm over the training rows it holds;
/// at a leaf, the arm with the largest mean is the leaf's policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTree {
    split_features: Box<[u32]>,
    thresholds: Box<[f64]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    is_leaf: Box<[bool]>,
    depths: Box<[u32]>,
    n_node_samples: Box<[u32]>,
    weighted_n_node_samples: Box<[f64]>,
    objectives: Box<[f64]>,
    gains: Box<[f64]>,
    /// `[n_nodes, n_arms]`.
    values: Array2<f64>,
    n_features: usize,
    feature_names: Vec<String>,
}

impl PolicyTree {
    /// Fit a policy tree on covariates `v` (`[n, f]`) and effects (`[n, k]`).
    ///
    /// Shorthand for [`PolicyTreeTrainer::fit`].
    pub fn fit(
        v: ArrayView2<f64>,
        effects: ArrayView2<f64>,
        feature_names: Vec<String>,
        config: &PolicyTreeConfig,
    ) -> Result<Self, FitError> {
        PolicyTreeTrainer::new(config.clone()).fit(v, effects, feature_names)
    }

    pub(crate) fn from_records(
        records: Vec<NodeRecord>,
        n_arms: usize,
        n_features: usize,
        feature_names: Vec<String>,
    ) -> Self {
        let n_nodes = records.len();
        let mut values = Array2::zeros((n_nodes, n_arms));
        for (i, r) in records.iter().enumerate() {
            debug_assert_eq!(r.value.len(), n_arms);
            values.row_mut(i).assign(&ArrayView1::from(&r.value[..]));
        }

        Self {
            split_features: records.iter().map(|r| r.split_feature).collect(),
            thresholds: records.iter().map(|r| r.threshold).collect(),
            left_children: records.iter().map(|r| r.left).collect(),
            right_children: records.iter().map(|r| r.right).collect(),
            is_leaf: records.iter().map(|r| r.is_leaf).collect(),
            depths: records.iter().map(|r| r.depth).collect(),
            n_node_samples: records.iter().map(|r| r.n_samples).collect(),
            weighted_n_node_samples: records.iter().map(|r| r.weighted_n_samples).collect(),
            objectives: records.iter().map(|r| r.objective).collect(),
            gains: records.iter().map(|r| r.gain).collect(),
            values,
            n_features,
            feature_names,
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&leaf| leaf).count()
    }

    /// Depth of the deepest leaf (0 for a single-leaf tree).
    pub fn depth(&self) -> u32 {
        self.depths.iter().copied().max().unwrap_or(0)
    }

    #[inline]
    pub fn n_arms(&self) -> usize {
        self.values.ncols()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    pub fn split_feature(&self, node: NodeId) -> usize {
        self.split_features[node as usize] as usize
    }

    #[inline]
    pub fn threshold(&self, node: NodeId) -> f64 {
        self.thresholds[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    pub fn node_depth(&self, node: NodeId) -> u32 {
        self.depths[node as usize]
    }

    /// Number of training rows that reached `node`.
    pub fn n_node_samples(&self, node: NodeId) -> usize {
        self.n_node_samples[node as usize] as usize
    }

    pub fn weighted_n_node_samples(&self, node: NodeId) -> f64 {
        self.weighted_n_node_samples[node as usize]
    }

    /// Summed effect of the best arm over the training rows at `node`.
    pub fn objective(&self, node: NodeId) -> f64 {
        self.objectives[node as usize]
    }

    /// Policy impurity: the negated mean effect of the best arm.
    pub fn impurity(&self, node: NodeId) -> f64 {
        -self.objective(node) / self.weighted_n_node_samples(node)
    }

    /// Weighted objective gain of the split at `node` (0 for leaves).
    pub fn gain(&self, node: NodeId) -> f64 {
        self.gains[node as usize]
    }

    /// Mean effect per arm at `node`.
    pub fn node_value(&self, node: NodeId) -> ArrayView1<'_, f64> {
        self.values.row(node as usize)
    }

    /// Arm with the largest mean effect at `node`; ties go to the lower index.
    pub fn optimal_arm(&self, node: NodeId) -> usize {
        argmax(self.node_value(node))
    }

    /// Leaf node ids in ascending order.
    pub fn leaves(&self) -> Vec<NodeId> {
        (0..self.n_nodes() as NodeId).filter(|&n| self.is_leaf(n)).collect()
    }

    /// Normalized total gain contributed by each feature.
    ///
    /// All zeros when the tree has no split with positive gain.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut importances = Array1::zeros(self.n_features);
        for node in 0..self.n_nodes() as NodeId {
            if !self.is_leaf(node) {
                importances[self.split_feature(node)] += self.gain(node).max(0.0);
            }
        }
        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }
        importances
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Leaf reached by a single row.
    ///
    /// NaN values fail every `<=` comparison and therefore go right.
    #[inline]
    pub fn traverse_to_leaf(&self, row: ArrayView1<f64>) -> NodeId {
        let mut node: NodeId = 0;
        while !self.is_leaf(node) {
            node = if row[self.split_feature(node)] <= self.threshold(node) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }
        node
    }

    /// Nodes visited by a single row, root first.
    pub fn path_to_leaf(&self, row: ArrayView1<f64>) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut node: NodeId = 0;
        path.push(node);
        while !self.is_leaf(node) {
            node = if row[self.split_feature(node)] <= self.threshold(node) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
            path.push(node);
        }
        path
    }

    fn check_features(&self, v: &ArrayView2<f64>) -> Result<(), QueryError> {
        if v.ncols() != self.n_features {
            return Err(QueryError::FeatureCountMismatch {
                expected: self.n_features,
                got: v.ncols(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Batch Queries
    // =========================================================================

    /// Index of the leaf each row of `v` ends up in.
    pub fn apply(&self, v: ArrayView2<f64>, parallelism: Parallelism) -> Result<Array1<NodeId>, QueryError> {
        self.check_features(&v)?;
        let leaves = parallelism.maybe_par_map(0..v.nrows(), |i| self.traverse_to_leaf(v.row(i)));
        Ok(Array1::from(leaves))
    }

    /// Decision path of each row of `v`.
    pub fn decision_path(
        &self,
        v: ArrayView2<f64>,
        parallelism: Parallelism,
    ) -> Result<DecisionPath, QueryError> {
        self.check_features(&v)?;
        let paths = parallelism.maybe_par_map(0..v.nrows(), |i| self.path_to_leaf(v.row(i)));
        Ok(DecisionPath::from_paths(paths, self.n_nodes()))
    }

    /// Optimal arm of each row's leaf.
    pub fn predict_ind(&self, v: ArrayView2<f64>, parallelism: Parallelism) -> Result<Array1<usize>, QueryError> {
        let leaves = self.apply(v, parallelism)?;
        Ok(leaves.mapv(|leaf| self.optimal_arm(leaf)))
    }

    /// Mean effect of the optimal arm in each row's leaf.
    pub fn predict_opt_effect(
        &self,
        v: ArrayView2<f64>,
        parallelism: Parallelism,
    ) -> Result<Array1<f64>, QueryError> {
        let leaves = self.apply(v, parallelism)?;
        Ok(leaves.mapv(|leaf| self.values[[leaf as usize, self.optimal_arm(leaf)]]))
    }

    /// Mean effect per arm in each row's leaf, `[n_rows, n_arms]`.
    pub fn leaf_values(&self, v: ArrayView2<f64>, parallelism: Parallelism) -> Result<Array2<f64>, QueryError> {
        let leaves = self.apply(v, parallelism)?;
        let mut out = Array2::zeros((leaves.len(), self.n_arms()));
        for (i, &leaf) in leaves.iter().enumerate() {
            out.row_mut(i).assign(&self.node_value(leaf));
        }
        Ok(out)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        let lens = [
            self.split_features.len(),
            self.thresholds.len(),
            self.left_children.len(),
            self.right_children.len(),
            self.is_leaf.len(),
            self.depths.len(),
            self.n_node_samples.len(),
            self.weighted_n_node_samples.len(),
            self.objectives.len(),
            self.gains.len(),
            self.values.nrows(),
        ];
        if lens.iter().any(|&len| len != n_nodes) {
            return Err(TreeValidationError::LenMismatch);
        }
        if self.n_arms() == 0 {
            return Err(TreeValidationError::NoArms);
        }
        if self.feature_names.len() != self.n_features {
            return Err(TreeValidationError::FeatureNamesMismatch {
                n_features: self.n_features,
                got: self.feature_names.len(),
            });
        }

        let mut visited = vec![false; n_nodes];
        let mut stack: Vec<NodeId> = vec![0];

        while let Some(node) = stack.pop() {
            let idx = node as usize;
            if visited[idx] {
                return Err(TreeValidationError::DuplicateVisit { node });
            }
            visited[idx] = true;

            if self.is_leaf(node) {
                continue;
            }

            let feature = self.split_features[idx];
            if feature as usize >= self.n_features {
                return Err(TreeValidationError::FeatureOutOfBounds {
                    node,
                    feature,
                    n_features: self.n_features,
                });
            }

            for (side, child) in [("left", self.left_child(node)), ("right", self.right_child(node))] {
                if child == node {
                    return Err(TreeValidationError::SelfLoop { node });
                }
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
                stack.push(child);
            }
        }

        match visited.iter().position(|&v| !v) {
            Some(i) => Err(TreeValidationError::UnreachableNode { node: i as NodeId }),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load a tree from JSON, validating its structure.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let tree: Self = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }
}

fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (k, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = k;
        }
    }
    best
}
