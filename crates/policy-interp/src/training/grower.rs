//! Tree growth.
//!
//! Samples live in a single index buffer; each node owns a contiguous range
//! of it, which is partitioned in place when the node is split. Nodes are
//! created as leaves and turned into splits when a valid split is applied,
//! so anything left unexpanded is a leaf by construction.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::ArrayView2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::criterion::{NodeStats, SplitCriterion};
use super::params::{GrowerParams, GrowthStrategy};
use super::sampling::FeatureSampler;
use super::splitter::{SplitContext, SplitInfo};
use crate::logger::FitLogger;
use crate::repr::{NodeId, NodeRecord};
use crate::utils::Parallelism;

/// A node waiting to be expanded.
#[derive(Debug)]
struct NodeTask {
    node: NodeId,
    start: usize,
    end: usize,
    depth: u32,
    stats: NodeStats,
}

/// A split chosen for a node, with its weighted gain.
#[derive(Debug)]
struct Expansion {
    task: NodeTask,
    split: SplitInfo,
    gain: f64,
}

impl PartialEq for Expansion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Expansion {}

impl PartialOrd for Expansion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expansion {
    /// Larger gain first; on equal gain the older (lower id) node first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.task.node.cmp(&self.task.node))
    }
}

/// Grows one policy tree.
pub struct TreeGrower<'a, C> {
    v: ArrayView2<'a, f64>,
    effects: ArrayView2<'a, f64>,
    criterion: &'a C,
    params: &'a GrowerParams,
    sampler: FeatureSampler,
    logger: FitLogger,
    rng: Xoshiro256PlusPlus,
    samples: Vec<u32>,
    records: Vec<NodeRecord>,
    total_weight: f64,
}

impl<'a, C: SplitCriterion> TreeGrower<'a, C> {
    pub fn new(
        v: ArrayView2<'a, f64>,
        effects: ArrayView2<'a, f64>,
        criterion: &'a C,
        params: &'a GrowerParams,
        logger: FitLogger,
    ) -> Self {
        let n_samples = v.nrows();
        Self {
            v,
            effects,
            criterion,
            params,
            sampler: FeatureSampler::new(v.ncols(), params.max_features.min(v.ncols())),
            logger,
            rng: Xoshiro256PlusPlus::seed_from_u64(params.seed),
            samples: (0..n_samples as u32).collect(),
            records: Vec::new(),
            total_weight: n_samples as f64,
        }
    }

    /// Grow the tree and return its nodes, root first.
    pub fn grow(mut self, parallelism: Parallelism) -> Vec<NodeRecord> {
        let root = self.new_node(0, self.samples.len(), 0);
        match self.params.growth_strategy {
            GrowthStrategy::DepthFirst => self.grow_depth_first(root, parallelism),
            GrowthStrategy::BestFirst { max_leaves } => self.grow_best_first(root, max_leaves, parallelism),
        }
        self.records
    }

    fn grow_depth_first(&mut self, root: NodeTask, parallelism: Parallelism) {
        let mut stack = vec![root];
        while let Some(task) = stack.pop() {
            if let Some(expansion) = self.evaluate(task, parallelism) {
                let (left, right) = self.apply_split(expansion);
                stack.push(right);
                stack.push(left);
            }
        }
    }

    fn grow_best_first(&mut self, root: NodeTask, max_leaves: u32, parallelism: Parallelism) {
        let mut frontier = BinaryHeap::new();
        frontier.extend(self.evaluate(root, parallelism));

        let mut n_leaves = 1u32;
        while n_leaves < max_leaves {
            let Some(expansion) = frontier.pop() else {
                break;
            };
            let (left, right) = self.apply_split(expansion);
            n_leaves += 1;
            for child in [left, right] {
                frontier.extend(self.evaluate(child, parallelism));
            }
        }
    }

    /// Create a leaf record for `samples[start..end]`.
    fn new_node(&mut self, start: usize, end: usize, depth: u32) -> NodeTask {
        let mut stats = NodeStats::empty(self.effects.ncols());
        for &s in &self.samples[start..end] {
            stats.add(self.criterion, self.effects.row(s as usize));
        }

        let node = self.records.len() as NodeId;
        self.records.push(NodeRecord {
            split_feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            is_leaf: true,
            depth,
            n_samples: stats.count as u32,
            weighted_n_samples: stats.weight,
            objective: self.criterion.objective(&stats.arm_sums),
            gain: 0.0,
            value: stats.mean(),
        });

        NodeTask {
            node,
            start,
            end,
            depth,
            stats,
        }
    }

    /// Decide whether `task` is split, and how.
    fn evaluate(&mut self, task: NodeTask, parallelism: Parallelism) -> Option<Expansion> {
        let p = self.params;
        let n = task.end - task.start;
        let stop = task.depth >= p.max_depth
            || n < p.min_samples_split
            || n < p.min_samples_leaf.saturating_mul(2)
            || task.stats.weight < 2.0 * p.min_weight_leaf
            || task.stats.is_pure(self.criterion);
        if stop {
            return None;
        }

        let ctx = SplitContext {
            v: self.v.view(),
            effects: self.effects.view(),
            criterion: self.criterion,
            params: p,
            sampler: &self.sampler,
        };
        let split = ctx.find_split(
            &self.samples[task.start..task.end],
            &task.stats,
            &mut self.rng,
            parallelism,
        )?;

        let parent_objective = self.criterion.objective(&task.stats.arm_sums);
        let gain = (split.children_objective - parent_objective) / self.total_weight;
        if gain + f64::EPSILON < p.min_impurity_decrease {
            return None;
        }

        Some(Expansion { task, split, gain })
    }

    /// Partition the node's samples and create both children.
    fn apply_split(&mut self, expansion: Expansion) -> (NodeTask, NodeTask) {
        let Expansion { task, split, gain } = expansion;
        let column = self.v.column(split.feature);

        let range = &mut self.samples[task.start..task.end];
        let (mut left, right): (Vec<u32>, Vec<u32>) = range
            .iter()
            .partition(|&&s| column[s as usize] <= split.threshold);
        let mid = task.start + left.len();
        left.extend(right);
        range.copy_from_slice(&left);

        let left_task = self.new_node(task.start, mid, task.depth + 1);
        let right_task = self.new_node(mid, task.end, task.depth + 1);

        let record = &mut self.records[task.node as usize];
        record.is_leaf = false;
        record.split_feature = split.feature as u32;
        record.threshold = split.threshold;
        record.left = left_task.node;
        record.right = right_task.node;
        record.gain = gain;

        self.logger.split(task.node, split.feature, split.threshold, gain);
        (left_task, right_task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Verbosity;
    use crate::training::criterion::PolicyReg;
    use ndarray::{Array1, Array2};

    fn step_data(n: usize) -> (Array2<f64>, Array2<f64>) {
        let v = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f64 } else { (i * 7 % n) as f64 });
        let effects = Array2::from_shape_fn((n, 2), |(i, k)| {
            let arm = usize::from(i >= n / 2);
            if k == arm { 1.0 } else { 0.0 }
        });
        (v, effects)
    }

    fn grow(v: &Array2<f64>, effects: &Array2<f64>, params: &GrowerParams) -> Vec<NodeRecord> {
        TreeGrower::new(v.view(), effects.view(), &PolicyReg, params, FitLogger::new(Verbosity::Silent))
            .grow(Parallelism::Sequential)
    }

    #[test]
    fn step_function_gives_two_pure_leaves() {
        let (v, effects) = step_data(20);
        let records = grow(&v, &effects, &GrowerParams::default());
        assert_eq!(records.len(), 3);
        assert!(!records[0].is_leaf);
        assert_eq!(records[0].split_feature, 0);
        assert!((records[0].threshold - 9.5).abs() < 1e-12);
        assert_eq!(records[1].value, vec![1.0, 0.0]);
        assert_eq!(records[2].value, vec![0.0, 1.0]);
        assert_eq!(records[0].gain, 0.5);
    }

    #[test]
    fn zero_depth_is_single_leaf() {
        let (v, effects) = step_data(20);
        let params = GrowerParams {
            max_depth: 0,
            ..GrowerParams::default()
        };
        let records = grow(&v, &effects, &params);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_leaf);
        assert_eq!(records[0].n_samples, 20);
    }

    #[test]
    fn best_first_respects_leaf_budget() {
        let n = 64;
        let v = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        // alternate preferred arm every 4 rows: many useful splits
        let effects = Array2::from_shape_fn((n, 2), |(i, k)| if (i / 4) % 2 == k { 1.0 } else { 0.0 });
        let params = GrowerParams {
            growth_strategy: GrowthStrategy::BestFirst { max_leaves: 5 },
            ..GrowerParams::default()
        };
        let records = grow(&v, &effects, &params);
        let n_leaves = records.iter().filter(|r| r.is_leaf).count();
        assert_eq!(n_leaves, 5);
        assert_eq!(records.len(), 9);
    }

    #[test]
    fn min_impurity_decrease_blocks_weak_splits() {
        let (v, effects) = step_data(20);
        // the step split gains 10 / 20 = 0.5
        let params = GrowerParams {
            min_impurity_decrease: 0.6,
            ..GrowerParams::default()
        };
        assert_eq!(grow(&v, &effects, &params).len(), 1);
    }

    #[test]
    fn leaves_partition_all_samples() {
        let n = 50;
        let v = Array2::from_shape_fn((n, 3), |(i, j)| ((i * (j + 3)) % 11) as f64);
        let effects = Array2::from_shape_fn((n, 3), |(i, k)| ((i * (k + 1)) % 5) as f64);
        let params = GrowerParams {
            min_samples_leaf: 3,
            ..GrowerParams::default()
        };
        let records = grow(&v, &effects, &params);
        let leaf_total: u32 = records.iter().filter(|r| r.is_leaf).map(|r| r.n_samples).sum();
        assert_eq!(leaf_total as usize, n);
        assert!(records.iter().filter(|r| r.is_leaf).all(|r| r.n_samples >= 3));

        // children sum to their parent
        for r in records.iter().filter(|r| !r.is_leaf) {
            let l = &records[r.left as usize];
            let rr = &records[r.right as usize];
            assert_eq!(l.n_samples + rr.n_samples, r.n_samples);
            assert_eq!(l.depth, r.depth + 1);
        }

        let sums: Array1<f64> = effects.sum_axis(ndarray::Axis(0));
        let root_mean: Vec<f64> = sums.iter().map(|s| s / n as f64).collect();
        assert_eq!(records[0].value, root_mean);
    }
}
