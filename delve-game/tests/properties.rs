use delve_game::{
    DungeonMapGenerator, MemoryStore, ProgressionManager, RecommendedAction,
    calculate_optimal_depth, calculate_return_cost, calculate_risk_level, calculate_run_energy,
    calculate_safety_margin, can_afford_return, generate_run_from_steps, get_recommended_action,
    validate_map,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn streak_bonus_on_a_round_number() {
    assert_eq!(calculate_run_energy(10_001, true), 12_001);
    assert_eq!(calculate_run_energy(10_001, false), 10_001);
}

proptest! {
    #[test]
    fn prop_return_cost_never_falls_with_depth(depth in 0u32..200) {
        prop_assert!(calculate_return_cost(depth + 1, &[]) >= calculate_return_cost(depth, &[]));
    }

    #[test]
    fn prop_margin_plus_cost_is_energy(energy in 0u32..1_000_000, depth in 0u32..60) {
        let cost = calculate_return_cost(depth, &[]);
        let margin = calculate_safety_margin(energy, cost);
        prop_assert_eq!(margin + i64::from(cost), i64::from(energy));
        prop_assert_eq!(can_afford_return(energy, cost), margin >= 0);
    }

    #[test]
    fn prop_risk_is_bounded(energy in 0u32..100_000, cost in 0u32..100_000) {
        let risk = calculate_risk_level(energy, cost);
        prop_assert!((0.0..=1.0).contains(&risk));
    }

    #[test]
    fn prop_unaffordable_return_always_recommends_return(energy in 0u32..5_000, depth in 1u32..40) {
        let cost = calculate_return_cost(depth, &[]);
        prop_assume!(energy < cost);
        let advice = get_recommended_action(energy, cost, depth);
        prop_assert_eq!(advice.action, RecommendedAction::Return);
    }

    #[test]
    fn prop_optimal_depth_is_affordable(energy in 0u32..50_000) {
        let depth = calculate_optimal_depth(energy, &[]);
        prop_assert!(calculate_return_cost(depth, &[]) <= energy);
    }

    #[test]
    fn prop_total_energy_is_base_plus_bonus(steps in 0u32..200_000) {
        let run = generate_run_from_steps("2024-06-01", steps).unwrap();
        prop_assert_eq!(run.total_energy, run.base_energy + run.bonus_energy);
        prop_assert_eq!(run.total_energy, calculate_run_energy(steps, run.has_streak_bonus));
    }

    #[test]
    fn prop_deepest_depth_never_decreases(
        runs in prop::collection::vec((0u32..30, any::<bool>()), 1..20)
    ) {
        let mut progression = ProgressionManager::new(MemoryStore::new(), "progression");
        let mut deepest = 0;
        for (depth, completed) in runs {
            let data = if completed {
                progression.process_run_completion(depth).unwrap()
            } else {
                progression.process_run_bust(depth).unwrap()
            };
            prop_assert!(data.all_time_deepest_depth >= deepest);
            deepest = data.all_time_deepest_depth;
            prop_assert_eq!(
                data.total_runs_attempted,
                data.total_runs_completed + data.total_runs_busted
            );
        }
    }

    #[test]
    fn prop_generated_maps_validate(seed in any::<u64>(), width in 1u32..6, depth in 1u32..25) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let map = DungeonMapGenerator::new(width).generate_full_map("run-prop", depth, &mut rng);
        prop_assert!(validate_map(&map).is_ok());
    }
}
