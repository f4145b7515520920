//! Feature order sampling for split search.
//!
//! Each node visits features in a fresh random order drawn from the tree's
//! seeded RNG. Only the first `max_features` non-constant features in that
//! order are evaluated, and between equally good splits the one found first
//! wins, so the seed decides ties.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Draws a random feature visiting order per node.
#[derive(Debug, Clone)]
pub struct FeatureSampler {
    n_features: usize,
    max_features: usize,
}

impl FeatureSampler {
    pub fn new(n_features: usize, max_features: usize) -> Self {
        debug_assert!(max_features >= 1 && max_features <= n_features);
        Self {
            n_features,
            max_features,
        }
    }

    #[inline]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// All features in a random order (Fisher-Yates).
    pub fn visiting_order(&self, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.n_features).collect();
        for i in 0..self.n_features.saturating_sub(1) {
            let j = rng.gen_range(i..self.n_features);
            order.swap(i, j);
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn order_is_a_permutation() {
        let sampler = FeatureSampler::new(10, 3);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut order = sampler.visiting_order(&mut rng);
        order.sort_unstable();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_order() {
        let sampler = FeatureSampler::new(20, 20);
        let a = sampler.visiting_order(&mut Xoshiro256PlusPlus::seed_from_u64(1));
        let b = sampler.visiting_order(&mut Xoshiro256PlusPlus::seed_from_u64(1));
        let c = sampler.visiting_order(&mut Xoshiro256PlusPlus::seed_from_u64(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
