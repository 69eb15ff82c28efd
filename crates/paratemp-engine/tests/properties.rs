use paratemp_engine::{acceptance_probability, build_geometric, log_acceptance, Distribution};
use proptest::prelude::*;

proptest! {
    #[test]
    fn geometric_ladder_is_strictly_increasing(
        t_min in 0.01f64..10.0,
        spread in 1.01f64..100.0,
        n in 2usize..64,
    ) {
        let t_max = t_min * spread;
        let ladder = build_geometric(t_min, t_max, n).unwrap();
        let temps = ladder.temperatures();
        prop_assert_eq!(temps.len(), n);
        prop_assert!((temps[0] - t_min).abs() <= 1e-12 * t_min);
        prop_assert!((temps[n - 1] - t_max).abs() <= 1e-9 * t_max);
        for pair in temps.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn boltzmann_ratio_reduces_to_classical_rule(
        e_i in -50.0f64..50.0,
        e_j in -50.0f64..50.0,
        beta_i in 0.01f64..10.0,
        beta_j in 0.01f64..10.0,
    ) {
        let generalized = log_acceptance(&Distribution::Boltzmann, e_i, beta_i, e_j, beta_j);
        let classical = (beta_i - beta_j) * (e_i - e_j);
        let scale = 1.0 + (beta_i * e_i).abs() + (beta_j * e_j).abs()
            + (beta_i * e_j).abs() + (beta_j * e_i).abs();
        prop_assert!((generalized - classical).abs() <= 1e-12 * scale);
    }

    #[test]
    fn exchange_ratio_is_antisymmetric(
        e_i in -5.0f64..5.0,
        e_j in -5.0f64..5.0,
        beta_i in 0.1f64..2.0,
        beta_j in 0.1f64..2.0,
        q in 0.5f64..0.95,
    ) {
        let dist = Distribution::tsallis(q).unwrap();
        let forward = log_acceptance(&dist, e_i, beta_i, e_j, beta_j);
        let backward = log_acceptance(&dist, e_j, beta_i, e_i, beta_j);
        if forward.is_finite() && backward.is_finite() {
            prop_assert!((forward + backward).abs() < 1e-9);
        }
    }

    #[test]
    fn acceptance_is_a_probability(log_ratio in proptest::num::f64::ANY) {
        let a = acceptance_probability(log_ratio);
        prop_assert!((0.0..=1.0).contains(&a));
    }
}
