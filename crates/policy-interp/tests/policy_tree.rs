//! Policy tree training integration tests.
//!
//! Focused on structural invariants under each growth limit and on
//! persistence of fitted trees.

use approx::assert_abs_diff_eq;
use ndarray::{Array2, Axis};
use rstest::rstest;

use policy_interp::model::{MaxFeatures, PolicyTreeConfig, SampleCount, Splitter};
use policy_interp::repr::{PolicyTree, TreeValidationError};
use policy_interp::testing::random_covariates;
use policy_interp::{Parallelism, PolicyTreeTrainer};

/// Noisy effects for three arms; arm 0 wins where `x0 + x1 < 0.6`, arm 2
/// where `x2 > 0.7`, arm 1 elsewhere.
fn problem(n: usize, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let v = random_covariates(n, 4, seed, 0.0, 1.0);
    let noise = random_covariates(n, 3, seed + 1, -0.2, 0.2);
    let effects = Array2::from_shape_fn((n, 3), |(i, k)| {
        let row = v.row(i);
        let best = if row[2] > 0.7 {
            2
        } else if row[0] + row[1] < 0.6 {
            0
        } else {
            1
        };
        let signal = if k == best { 1.0 } else { 0.0 };
        signal + noise[[i, k]]
    });
    (v, effects)
}

fn fit(config: PolicyTreeConfig, v: &Array2<f64>, effects: &Array2<f64>) -> PolicyTree {
    PolicyTree::fit(v.view(), effects.view(), vec![], &config).unwrap()
}

#[rstest]
#[case::depth_first(PolicyTreeConfig::default())]
#[case::random_splitter(PolicyTreeConfig::builder().splitter(Splitter::Random).build().unwrap())]
#[case::best_first(PolicyTreeConfig::builder().max_leaf_nodes(6).build().unwrap())]
#[case::subsampled(PolicyTreeConfig::builder().max_features(MaxFeatures::Fixed(2)).build().unwrap())]
fn fitted_tree_is_structurally_valid(#[case] config: PolicyTreeConfig) {
    let (v, effects) = problem(200, 3);
    let tree = fit(config, &v, &effects);
    tree.validate().unwrap();

    let leaves = tree.apply(v.view(), Parallelism::Sequential).unwrap();
    assert!(leaves.iter().all(|&leaf| tree.is_leaf(leaf)));

    let paths = tree.decision_path(v.view(), Parallelism::Sequential).unwrap();
    assert_eq!(paths.n_rows(), v.nrows());
    for (row, &leaf) in leaves.iter().enumerate() {
        let nodes = paths.nodes(row);
        assert_eq!(nodes[0], 0);
        assert_eq!(nodes.last().copied(), Some(leaf));
    }

    let total: usize = tree.leaves().iter().map(|&leaf| tree.n_node_samples(leaf)).sum();
    assert_eq!(total, v.nrows());
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(7)]
fn best_first_respects_max_leaf_nodes(#[case] max_leaf_nodes: u32) {
    let (v, effects) = problem(300, 5);
    let config = PolicyTreeConfig::builder().max_leaf_nodes(max_leaf_nodes).build().unwrap();
    let tree = fit(config, &v, &effects);
    assert!(tree.n_leaves() <= max_leaf_nodes as usize);
    assert!(tree.n_leaves() >= 2);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
fn depth_is_bounded(#[case] max_depth: u32) {
    let (v, effects) = problem(300, 7);
    let config = PolicyTreeConfig::builder().max_depth(max_depth).build().unwrap();
    let tree = fit(config, &v, &effects);
    assert!(tree.depth() <= max_depth);
    assert!(tree.n_leaves() <= 1 << max_depth);
}

#[rstest]
#[case::absolute(SampleCount::Absolute(15), 15)]
#[case::fraction(SampleCount::Fraction(0.1), 20)]
fn leaves_hold_min_samples(#[case] min_samples_leaf: SampleCount, #[case] expected_min: usize) {
    let (v, effects) = problem(200, 9);
    let config = PolicyTreeConfig::builder().min_samples_leaf(min_samples_leaf).build().unwrap();
    let tree = fit(config, &v, &effects);
    assert!(tree.n_leaves() > 1);
    for leaf in tree.leaves() {
        assert!(tree.n_node_samples(leaf) >= expected_min);
    }
}

#[test]
fn min_weight_fraction_limits_leaf_weight() {
    let (v, effects) = problem(200, 10);
    let config = PolicyTreeConfig::builder().min_weight_fraction_leaf(0.2).build().unwrap();
    let tree = fit(config, &v, &effects);
    for leaf in tree.leaves() {
        assert!(tree.weighted_n_node_samples(leaf) >= 40.0);
    }
}

#[test]
fn min_impurity_decrease_prunes_weak_splits() {
    let (v, effects) = problem(200, 11);
    let full = fit(PolicyTreeConfig::default(), &v, &effects);
    let config = PolicyTreeConfig::builder().min_impurity_decrease(0.05).build().unwrap();
    let pruned = fit(config, &v, &effects);
    assert!(pruned.n_leaves() < full.n_leaves());
    for node in 0..pruned.n_nodes() as u32 {
        if !pruned.is_leaf(node) {
            assert!(pruned.gain(node) + f64::EPSILON >= 0.05);
        }
    }
}

#[test]
fn feature_importances_sum_to_one() {
    let (v, effects) = problem(200, 13);
    let tree = fit(PolicyTreeConfig::builder().max_depth(4).build().unwrap(), &v, &effects);
    let importances = tree.feature_importances();
    assert_eq!(importances.len(), 4);
    assert_abs_diff_eq!(importances.sum(), 1.0, epsilon = 1e-12);
    // x3 carries no signal
    assert!(importances[3] < importances[0]);
}

#[test]
fn leaf_policy_matches_leaf_means() {
    let (v, effects) = problem(200, 17);
    let tree = fit(PolicyTreeConfig::builder().max_depth(3).build().unwrap(), &v, &effects);
    let leaves = tree.apply(v.view(), Parallelism::Sequential).unwrap();

    for leaf in tree.leaves() {
        let rows: Vec<usize> = (0..v.nrows()).filter(|&i| leaves[i] == leaf).collect();
        let mean = effects.select(Axis(0), &rows).mean_axis(Axis(0)).unwrap();
        for (k, &m) in mean.iter().enumerate() {
            assert_abs_diff_eq!(tree.node_value(leaf)[k], m, epsilon = 1e-12);
        }
        let best = tree.optimal_arm(leaf);
        assert!(mean.iter().all(|&m| m <= mean[best]));
    }

    let opt = tree.predict_opt_effect(v.view(), Parallelism::Sequential).unwrap();
    let arms = tree.predict_ind(v.view(), Parallelism::Sequential).unwrap();
    for i in 0..v.nrows() {
        assert_eq!(opt[i], tree.node_value(leaves[i])[arms[i]]);
    }
}

#[test]
fn parallel_queries_match_sequential() {
    let (v, effects) = problem(500, 19);
    let tree = fit(PolicyTreeConfig::default(), &v, &effects);
    assert_eq!(
        tree.apply(v.view(), Parallelism::Sequential).unwrap(),
        tree.apply(v.view(), Parallelism::Parallel).unwrap()
    );
    assert_eq!(
        tree.decision_path(v.view(), Parallelism::Sequential).unwrap(),
        tree.decision_path(v.view(), Parallelism::Parallel).unwrap()
    );
}

#[test]
fn json_roundtrip_preserves_apply() {
    let (v, effects) = problem(150, 23);
    let trainer = PolicyTreeTrainer::new(PolicyTreeConfig::builder().max_depth(4).build().unwrap());
    let tree = trainer.fit(v.view(), effects.view(), vec![]).unwrap();

    let restored = PolicyTree::from_json(&tree.to_json().unwrap()).unwrap();
    assert_eq!(restored.feature_names(), ["x0", "x1", "x2", "x3"]);
    assert_eq!(
        restored.apply(v.view(), Parallelism::Sequential).unwrap(),
        tree.apply(v.view(), Parallelism::Sequential).unwrap()
    );
}

#[rstest]
#[case::self_loop("self_loop", TreeValidationError::SelfLoop { node: 0 })]
#[case::no_arms("no_arms", TreeValidationError::NoArms)]
#[case::missing_name("missing_name", TreeValidationError::FeatureNamesMismatch { n_features: 4, got: 3 })]
fn corrupted_json_fails_validation(#[case] corruption: &str, #[case] expected: TreeValidationError) {
    let (v, effects) = problem(100, 29);
    let tree = fit(PolicyTreeConfig::builder().max_depth(2).build().unwrap(), &v, &effects);
    assert!(tree.n_nodes() > 1);

    let mut json: serde_json::Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();
    match corruption {
        "self_loop" => json["left_children"][0] = serde_json::json!(0),
        "no_arms" => {
            json["values"] = serde_json::json!({ "v": 1, "dim": [tree.n_nodes(), 0], "data": [] });
        }
        "missing_name" => {
            json["feature_names"].as_array_mut().unwrap().pop();
        }
        other => unreachable!("unknown corruption {other}"),
    }
    let err = PolicyTree::from_json(&json.to_string()).unwrap_err();
    match err {
        policy_interp::repr::PersistError::Invalid(found) => assert_eq!(found, expected),
        other => panic!("expected a validation error, got {other:?}"),
    }
}
