//! Split search for a single node.

use ndarray::ArrayView2;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::criterion::{NodeStats, SplitCriterion};
use super::params::GrowerParams;
use super::sampling::FeatureSampler;
use crate::model::Splitter;
use crate::utils::Parallelism;

/// Features whose range in a node is below this are treated as constant.
pub const FEATURE_THRESHOLD: f64 = 1e-7;

/// Best split found for a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitInfo {
    pub feature: usize,
    /// Rows with `x[feature] <= threshold` go left.
    pub threshold: f64,
    /// `objective(left) + objective(right)`.
    pub children_objective: f64,
}

/// Read-only inputs shared by every node's split search.
pub struct SplitContext<'a, C> {
    pub v: ArrayView2<'a, f64>,
    pub effects: ArrayView2<'a, f64>,
    pub criterion: &'a C,
    pub params: &'a GrowerParams,
    pub sampler: &'a FeatureSampler,
}

impl<C: SplitCriterion> SplitContext<'_, C> {
    /// Find the best split of `samples`.
    ///
    /// Features are visited in the sampler's random order; constant features
    /// are skipped without counting against `max_features`. Candidate
    /// features are evaluated in parallel when allowed, but the winner is
    /// always the first best candidate in visiting order.
    pub fn find_split(
        &self,
        samples: &[u32],
        parent: &NodeStats,
        rng: &mut Xoshiro256PlusPlus,
        parallelism: Parallelism,
    ) -> Option<SplitInfo> {
        let mut candidates: Vec<(usize, Option<f64>)> = Vec::with_capacity(self.sampler.max_features());
        for feature in self.sampler.visiting_order(rng) {
            if candidates.len() == self.sampler.max_features() {
                break;
            }
            let (min, max) = self.feature_range(samples, feature);
            if max <= min + FEATURE_THRESHOLD {
                continue;
            }
            let threshold = match self.params.splitter {
                Splitter::Best => None,
                Splitter::Random => Some(rng.gen_range(min..max)),
            };
            candidates.push((feature, threshold));
        }

        let found = parallelism.maybe_par_map(candidates, |(feature, threshold)| match threshold {
            None => self.best_threshold(samples, parent, feature),
            Some(t) => self.evaluate_threshold(samples, parent, feature, t),
        });

        let mut best: Option<SplitInfo> = None;
        for split in found.into_iter().flatten() {
            if best
                .as_ref()
                .map_or(true, |b| split.children_objective > b.children_objective)
            {
                best = Some(split);
            }
        }
        best
    }

    fn feature_range(&self, samples: &[u32], feature: usize) -> (f64, f64) {
        let column = self.v.column(feature);
        samples
            .iter()
            .map(|&s| column[s as usize])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)))
    }

    #[inline]
    fn children_valid(&self, n_left: usize, n_right: usize) -> bool {
        let p = self.params;
        n_left >= p.min_samples_leaf
            && n_right >= p.min_samples_leaf
            && n_left as f64 >= p.min_weight_leaf
            && n_right as f64 >= p.min_weight_leaf
    }

    /// Scan every boundary between consecutive distinct values.
    fn best_threshold(&self, samples: &[u32], parent: &NodeStats, feature: usize) -> Option<SplitInfo> {
        let column = self.v.column(feature);
        let mut sorted: Vec<(f64, u32)> = samples.iter().map(|&s| (column[s as usize], s)).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let n_arms = parent.arm_sums.len();
        let mut left = vec![0.0; n_arms];
        let mut right = vec![0.0; n_arms];
        let mut best: Option<(f64, usize)> = None;

        for pos in 1..n {
            let row = self.effects.row(sorted[pos - 1].1 as usize);
            for (l, &y) in left.iter_mut().zip(row.iter()) {
                *l += y;
            }

            if sorted[pos].0 <= sorted[pos - 1].0 + FEATURE_THRESHOLD {
                continue;
            }
            if !self.children_valid(pos, n - pos) {
                continue;
            }

            for ((r, &total), &l) in right.iter_mut().zip(parent.arm_sums.iter()).zip(left.iter()) {
                *r = total - l;
            }
            let score = self.criterion.objective(&left) + self.criterion.objective(&right);
            if best.map_or(true, |(b, _)| score > b) {
                best = Some((score, pos));
            }
        }

        best.map(|(score, pos)| {
            let lo = sorted[pos - 1].0;
            let hi = sorted[pos].0;
            let mut threshold = lo / 2.0 + hi / 2.0;
            if threshold >= hi || !threshold.is_finite() {
                threshold = lo;
            }
            SplitInfo {
                feature,
                threshold,
                children_objective: score,
            }
        })
    }

    /// Evaluate one drawn threshold.
    fn evaluate_threshold(
        &self,
        samples: &[u32],
        parent: &NodeStats,
        feature: usize,
        threshold: f64,
    ) -> Option<SplitInfo> {
        let column = self.v.column(feature);
        let mut left = vec![0.0; parent.arm_sums.len()];
        let mut n_left = 0;
        for &s in samples {
            if column[s as usize] <= threshold {
                for (l, &y) in left.iter_mut().zip(self.effects.row(s as usize).iter()) {
                    *l += y;
                }
                n_left += 1;
            }
        }
        if !self.children_valid(n_left, samples.len() - n_left) {
            return None;
        }

        let right: Vec<f64> = parent.arm_sums.iter().zip(&left).map(|(t, l)| t - l).collect();
        Some(SplitInfo {
            feature,
            threshold,
            children_objective: self.criterion.objective(&left) + self.criterion.objective(&right),
        })
    }
}
