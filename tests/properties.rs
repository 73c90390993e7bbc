use std::collections::BTreeSet;

use proptest::prelude::*;
use test_case::test_case;

mod common;

const TOL: f64 = 1e-9;

#[test]
fn exact_dominates_greedy_at_every_budget() {
    for tree in [common::mixed(), common::shifting_branches(), common::star(7)] {
        let budget = tree.ids.len().min(8);
        let greedy = common::greedy(&tree, budget);
        let exact = common::optimal(&tree, budget, 0.0);

        for ((k, h_greedy), (_, h_exact)) in
            greedy.entropies.iter().zip(exact.entropies.iter())
        {
            assert!(
                h_exact + TOL >= *h_greedy,
                "greedy beat the optimum at k = {k}: {h_greedy} > {h_exact}"
            );
        }
    }
}

#[test_case(0.5)]
#[test_case(0.1)]
#[test_case(0.01)]
fn approximation_stays_within_epsilon(epsilon: f64) {
    let tree = common::mixed();
    let budget = 7;
    let exact = common::optimal(&tree, budget, 0.0);
    let approx = common::optimal(&tree, budget, epsilon);

    for ((k, h_exact), (_, h_approx)) in exact.entropies.iter().zip(approx.entropies.iter()) {
        let gap = h_exact - h_approx;
        assert!(
            gap >= -TOL,
            "approximate entropy exceeded the optimum at k = {k}: gap {gap}"
        );
        assert!(
            gap <= epsilon + TOL,
            "approximation gap {gap} above {epsilon} at k = {k}"
        );
    }
}

#[test]
fn optimal_entropy_is_monotone_in_the_budget() {
    for tree in [common::mixed(), common::shifting_branches(), common::chain()] {
        let budget = tree.ids.len();
        let out = common::optimal(&tree, budget, 0.0);
        for pair in out.entropies.windows(2) {
            assert!(
                pair[1].1 + TOL >= pair[0].1,
                "entropy dropped from k = {} to k = {}",
                pair[0].0,
                pair[1].0
            );
        }
    }
}

/// Optimal summaries do not nest: spending one more piece can move budget
/// across branches, abandoning nodes the smaller summary exposed.
#[test]
fn optimal_summaries_can_shift_between_branches() {
    let tree = common::shifting_branches();
    let out = common::optimal(&tree, 5, 0.0);

    let exposed = |k: usize| -> BTreeSet<u64> {
        out.summaries[k - 1]
            .rows()
            .iter()
            .filter_map(|r| r.node)
            .collect()
    };

    let at_4 = exposed(4);
    let at_5 = exposed(5);
    assert!(
        !at_4.is_subset(&at_5) && !at_5.is_subset(&at_4),
        "expected incomparable node sets, got {at_4:?} then {at_5:?}"
    );

    // Hand-computed optima for this tree (total weight 29).
    let w = 29.0;
    let h = |masses: &[f64]| -> f64 {
        masses
            .iter()
            .filter(|m| **m > 0.0)
            .map(|m| -(m / w) * (m / w).ln())
            .sum()
    };
    let expected_4 = h(&[2.0, 5.0, 5.0, 17.0]);
    let expected_5 = h(&[2.0, 10.0, 1.0, 8.0, 8.0]);
    assert!((out.entropies[3].1 - expected_4).abs() < 1e-6);
    assert!((out.entropies[4].1 - expected_5).abs() < 1e-6);
}

fn arb_tree(max_nodes: usize) -> impl Strategy<Value = common::Fixture> {
    prop::collection::vec((any::<prop::sample::Index>(), 0.0f64..10.0), 1..max_nodes).prop_map(
        |nodes| {
            let mut rows = vec![(1u64, 0u64, 1.0f64)];
            for (i, (parent_pick, weight)) in nodes.into_iter().enumerate() {
                let parent = rows[parent_pick.index(rows.len())].0;
                rows.push((2 + i as u64, parent, weight));
            }
            common::Fixture::from_rows(&rows)
        },
    )
}

proptest! {
    #[test]
    fn random_trees_conserve_mass_and_respect_dominance(tree in arb_tree(10)) {
        let budget = tree.ids.len().min(6);
        let total = tree.total_weight();

        let greedy = common::greedy(&tree, budget);
        let exact = common::optimal(&tree, budget, 0.0);

        for out in [&greedy, &exact] {
            prop_assert_eq!(out.entropies.len(), budget);
            for (k, summary) in out.summaries.iter().enumerate() {
                prop_assert_eq!(summary.len(), k + 1);
                prop_assert!(
                    (summary.total_weight() - total).abs() < 1e-6,
                    "mass drifted at k = {}: {} vs {}", k + 1, summary.total_weight(), total
                );
                let h = summary.entropy(total);
                prop_assert!(h.is_finite() && h >= -TOL, "entropy {} out of range", h);
            }
        }

        for ((k, h_greedy), (_, h_exact)) in greedy.entropies.iter().zip(exact.entropies.iter()) {
            prop_assert!(
                h_exact + 1e-7 >= *h_greedy,
                "greedy beat the optimum at k = {}: {} > {}", k, h_greedy, h_exact
            );
        }
    }

    #[test]
    fn random_trees_respect_the_approximation_bound(tree in arb_tree(8), eps in 0.05f64..0.5) {
        let budget = tree.ids.len().min(5);
        let exact = common::optimal(&tree, budget, 0.0);
        let approx = common::optimal(&tree, budget, eps);

        for ((k, h_exact), (_, h_approx)) in exact.entropies.iter().zip(approx.entropies.iter()) {
            let gap = h_exact - h_approx;
            prop_assert!(gap >= -1e-7, "approx above optimum at k = {}", k);
            prop_assert!(gap <= eps + 1e-7, "gap {} above {} at k = {}", gap, eps, k);
        }
    }
}
