//! Property tests: rank-sum reconciliation, click weights and sampling.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use serpsynth_core::types::PositionSample;
use serpsynth_pipeline::stages::clicks::{click_weights, draw_indices};
use serpsynth_pipeline::stages::positions::{
    generate_positions, reconcile_sum, target_sum, PositionBounds,
};

fn candidates(ranks: &[u32]) -> Vec<PositionSample> {
    ranks
        .iter()
        .enumerate()
        .map(|(i, &rank)| PositionSample {
            id: 1,
            impression_position: rank,
            impression_order: i as u32 + 1,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_reconciled_sum_hits_reachable_target(
        avg in 0.0f64..60.0,
        n in 1usize..300,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let bounds = PositionBounds::for_average(avg).unwrap();
        let mut ranks = generate_positions(n, &bounds, &mut rng);
        let target = target_sum(avg, n);

        let realized = reconcile_sum(&mut ranks, target);

        prop_assert!(ranks.iter().all(|&r| r >= 1));
        prop_assert_eq!(realized, ranks.iter().map(|&r| u64::from(r)).sum::<u64>());
        if target >= n as u64 {
            prop_assert_eq!(realized, target);
        } else {
            prop_assert!(ranks.iter().all(|&r| r == 1));
        }
    }

    #[test]
    fn prop_reconcile_is_monotone(
        mut ranks in prop::collection::vec(1u32..30, 1..100),
        delta in -50i64..50,
    ) {
        let before = ranks.clone();
        let sum: i64 = before.iter().map(|&r| i64::from(r)).sum();
        let target = (sum + delta).max(0) as u64;

        reconcile_sum(&mut ranks, target);

        // Raising never lowers a value; lowering never raises one.
        for (b, a) in before.iter().zip(&ranks) {
            if delta >= 0 {
                prop_assert!(a >= b);
            } else {
                prop_assert!(a <= b);
            }
        }
    }

    #[test]
    fn prop_bounds_are_ordered(avg in 0.0f64..1000.0) {
        let b = PositionBounds::for_average(avg).unwrap();
        prop_assert!(b.min >= 1);
        prop_assert!(b.max > b.min);
        prop_assert!((0.05..=0.95).contains(&b.p));
    }

    #[test]
    fn prop_weights_are_normalized(ranks in prop::collection::vec(1u32..120, 1..500)) {
        let w = click_weights(&candidates(&ranks));
        prop_assert_eq!(w.len(), ranks.len());
        prop_assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        prop_assert!(w.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn prop_draws_respect_replacement_rule(
        ranks in prop::collection::vec(1u32..20, 1..60),
        extra in 0usize..40,
        seed in any::<u64>(),
    ) {
        let weights = click_weights(&candidates(&ranks));
        let mut rng = StdRng::seed_from_u64(seed);

        let count = (seed as usize % (ranks.len() + extra)) + 1;
        let drawn = draw_indices(&weights, count, &mut rng).unwrap();

        prop_assert_eq!(drawn.len(), count);
        prop_assert!(drawn.iter().all(|&i| i < ranks.len()));
        if count <= ranks.len() {
            let mut distinct = drawn.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), count);
        }
    }
}
