use std::sync::Arc;

use proptest::prelude::*;

use qkp_core::canonical::{parse, render};
use qkp_core::synth::synthesize_seeded;
use qkp_core::{derive_budget, BenchmarkKey, CanonicalInstance, Instance, SynthParams};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn synthesis_is_deterministic(n in 1u32..40, density in 0u32..=100, seed in any::<u64>()) {
        let params = SynthParams::new(n, density, seed);
        let a = synthesize_seeded(&params).unwrap();
        let b = synthesize_seeded(&params).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn synthesized_edges_are_sparse_upper_triangle(n in 1u32..40, density in 0u32..=100, seed in any::<u64>()) {
        let m = synthesize_seeded(&SynthParams::new(n, density, seed)).unwrap();
        for e in &m.edges {
            prop_assert!(e.utility != 0.0);
            prop_assert!(e.i <= e.j && e.j < n);
        }
        prop_assert_eq!(m.weights.len(), n as usize);
    }

    #[test]
    fn canonical_round_trip(n in 1u32..25, density in 0u32..=100, seed in any::<u64>(), level in 0u32..=1000, ofv in any::<i64>()) {
        let matrix = synthesize_seeded(&SynthParams::new(n, density, seed)).unwrap();
        let budget = derive_budget(&matrix.weights, level).unwrap();
        let canonical = CanonicalInstance {
            instance: Instance::new(BenchmarkKey::new(n, density.to_string(), 0), Arc::new(matrix.clone()), budget),
            best_known_objective: ofv,
        };
        let back = parse(&render(&canonical)).unwrap();
        prop_assert_eq!(back.matrix, matrix);
        prop_assert_eq!(back.budget, budget);
        prop_assert_eq!(back.best_known_objective, ofv);
    }

    #[test]
    fn budget_is_floor_of_per_mille(weights in prop::collection::vec(1u32..=50, 1..200), level in 0u32..=1000) {
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        let budget = derive_budget(&weights, level).unwrap() as u64;
        prop_assert!(budget * 1000 <= level as u64 * total);
        prop_assert!((budget + 1) * 1000 > level as u64 * total);
    }
}
