//! Split criteria.
//!
//! A criterion scores a node from the per-arm sums of its units' effects.
//! The policy criterion ([`PolicyReg`]) assigns every node the single arm
//! with the largest summed effect:
//!
//! ```text
//! objective(node) = max_k  sum_{i in node} y_ik
//! ```
//!
//! A split is worth `objective(left) + objective(right) - objective(parent)`,
//! which is never negative since `max` is subadditive.

use ndarray::ArrayView1;

/// Scores nodes from per-arm effect sums.
pub trait SplitCriterion: Sync {
    /// Objective of a node whose units have per-arm effect sums `arm_sums`.
    fn objective(&self, arm_sums: &[f64]) -> f64;

    /// Best objective a single unit can reach on its own.
    ///
    /// The sum of this over a node's units bounds the objective any partition
    /// of the node can reach; a node at the bound is pure.
    fn unit_bound(&self, effects: ArrayView1<f64>) -> f64;
}

/// The `policy_reg` criterion.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyReg;

impl SplitCriterion for PolicyReg {
    #[inline]
    fn objective(&self, arm_sums: &[f64]) -> f64 {
        arm_sums.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    #[inline]
    fn unit_bound(&self, effects: ArrayView1<f64>) -> f64 {
        effects.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

// =============================================================================
// NodeStats
// =============================================================================

/// Sufficient statistics of the units in one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStats {
    /// Per-arm effect sums.
    pub arm_sums: Vec<f64>,
    /// Sum of `unit_bound` over the node's units.
    pub bound: f64,
    pub count: usize,
    /// Sum of sample weights (unit weights, so equal to `count`).
    pub weight: f64,
}

impl NodeStats {
    pub fn empty(n_arms: usize) -> Self {
        Self {
            arm_sums: vec![0.0; n_arms],
            bound: 0.0,
            count: 0,
            weight: 0.0,
        }
    }

    #[inline]
    pub fn add<C: SplitCriterion>(&mut self, criterion: &C, effects: ArrayView1<f64>) {
        for (sum, &y) in self.arm_sums.iter_mut().zip(effects.iter()) {
            *sum += y;
        }
        self.bound += criterion.unit_bound(effects);
        self.count += 1;
        self.weight += 1.0;
    }

    /// Mean effect per arm.
    pub fn mean(&self) -> Vec<f64> {
        if self.weight > 0.0 {
            self.arm_sums.iter().map(|s| s / self.weight).collect()
        } else {
            vec![0.0; self.arm_sums.len()]
        }
    }

    /// True when no partition of the node can raise its objective.
    pub fn is_pure<C: SplitCriterion>(&self, criterion: &C) -> bool {
        let objective = criterion.objective(&self.arm_sums);
        self.bound - objective <= 1e-9 * (1.0 + self.bound.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn objective_is_best_arm_sum() {
        assert_eq!(PolicyReg.objective(&[1.0, 3.0, -2.0]), 3.0);
    }

    #[test]
    fn stats_accumulate() {
        let mut stats = NodeStats::empty(2);
        stats.add(&PolicyReg, array![1.0, 0.0].view());
        stats.add(&PolicyReg, array![0.0, 3.0].view());
        assert_eq!(stats.arm_sums, vec![1.0, 3.0]);
        assert_eq!(stats.bound, 4.0);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean(), vec![0.5, 1.5]);
        assert!(!stats.is_pure(&PolicyReg));
    }

    #[test]
    fn node_agreeing_on_one_arm_is_pure() {
        let mut stats = NodeStats::empty(2);
        stats.add(&PolicyReg, array![1.0, 0.0].view());
        stats.add(&PolicyReg, array![2.0, -1.0].view());
        assert!(stats.is_pure(&PolicyReg));
    }
}
