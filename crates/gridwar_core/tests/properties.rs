//! Property tests over the public simulation API.

use gridwar_core::economy;
use gridwar_core::prelude::*;
use gridwar_test_utils::determinism::{strategies, verify_simulation_determinism};
use gridwar_test_utils::fixtures::{flat_config, place, siege_sim, two_player_sim};
use gridwar_test_utils::proptest::prelude::*;

fn storage_with_shares(shares: &[u32]) -> (UnitStorage, Vec<UnitId>) {
    let config = SimConfig::default();
    let stats = config.catalog.stats(UnitKind::StorageTower);
    let mut storage = UnitStorage::new();
    let ids = shares
        .iter()
        .map(|&resources| {
            let params = UnitSpawnParams {
                kind: UnitKind::StorageTower,
                resources,
                ..Default::default()
            };
            storage.insert(params.build(&stats, &config))
        })
        .collect();
    (storage, ids)
}

fn shares_of(storage: &UnitStorage, ids: &[UnitId]) -> Vec<u32> {
    ids.iter()
        .map(|&id| storage.get(id).map_or(0, |u| u.resources))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_off_grid_placement_is_rejected(coord in strategies::arb_any_coord()) {
        let (mut sim, user, _) = two_player_sim();
        prop_assume!(!sim.grid().in_bounds(coord));
        let hash = sim.state_hash();

        let result = sim.create_unit(UnitSpawnParams {
            kind: UnitKind::WallTower,
            owner: Owner::Player(user),
            position: coord,
            force: true,
            ..Default::default()
        });

        prop_assert_eq!(result, Err(GameError::InvalidCoordinate(coord)));
        prop_assert!(sim.grid().cell_at(coord).is_none());
        prop_assert!(sim.grid().occupants(coord).is_empty());
        prop_assert_eq!(sim.state_hash(), hash);
    }

    #[test]
    fn prop_pixel_center_maps_back_to_cell(
        coord in strategies::arb_grid_coord(16, 12),
        pan in strategies::arb_pan(),
    ) {
        let sim = Simulation::new(flat_config()).unwrap();
        let center = sim.grid().grid_to_pixel_center(coord, pan);
        prop_assert_eq!(sim.grid().pixel_to_grid(center, pan), Some(coord));
    }

    #[test]
    fn prop_redistribution_conserves_and_levels(shares in strategies::arb_shares(12)) {
        let (mut storage, ids) = storage_with_shares(&shares);
        let total: u32 = shares.iter().sum();

        economy::redistribute_resources(&ids, &mut storage);
        let once = shares_of(&storage, &ids);
        prop_assert_eq!(economy::total_resources(&ids, &storage), total);

        let max = once.iter().copied().max().unwrap_or(0);
        let min = once.iter().copied().min().unwrap_or(0);
        prop_assert!(max - min <= 1);

        economy::redistribute_resources(&ids, &mut storage);
        prop_assert_eq!(shares_of(&storage, &ids), once);
    }

    #[test]
    fn prop_spend_is_exact_or_untouched(
        shares in strategies::arb_shares(12),
        amount in 0u32..6000,
    ) {
        let (mut storage, ids) = storage_with_shares(&shares);
        let total: u32 = shares.iter().sum();
        let before = shares_of(&storage, &ids);

        let spent = economy::spend_resources(&ids, &mut storage, amount);

        if amount <= total {
            prop_assert!(spent);
            prop_assert_eq!(economy::total_resources(&ids, &storage), total - amount);
        } else {
            prop_assert!(!spent);
            prop_assert_eq!(shares_of(&storage, &ids), before);
        }
    }

    #[test]
    fn prop_destroyed_unit_leaves_no_edges(
        cells in proptest::collection::vec(strategies::arb_grid_coord(16, 12), 2..8),
        victim in 0usize..8,
    ) {
        let (mut sim, user, _) = two_player_sim();
        let ids: Vec<UnitId> = cells
            .iter()
            .map(|c| place(&mut sim, UnitKind::WallTower, user, c.x, c.y, 0))
            .collect();
        let victim = ids[victim % ids.len()];
        let victim_cell = sim.unit(victim).unwrap().grid_position;

        sim.destroy_unit(victim).unwrap();

        prop_assert!(sim.edges().edges_of(victim).next().is_none());
        prop_assert!(!sim.player(user).unwrap().owns(victim));
        prop_assert!(!sim.grid().occupants(victim_cell).contains(&victim));
        for edge in sim.edges().edges() {
            prop_assert!(sim.unit(edge.a).is_some() && sim.unit(edge.b).is_some());
        }
        for &id in ids.iter().filter(|&&id| id != victim) {
            let count = sim.edges().edges_of(id).count() as u32;
            prop_assert_eq!(sim.unit(id).unwrap().link_count, count);
        }
    }

    #[test]
    fn prop_ticks_never_leave_dead_units(seed in any::<u64>(), delta in strategies::arb_delta()) {
        let mut sim = siege_sim(seed, 3, 5);
        for _ in 0..60 {
            sim.tick(delta);
            prop_assert!(sim.units().iter().all(|u| u.is_ghost() || u.is_alive()));
            for player in sim.players() {
                for &id in &player.units {
                    let unit = sim.unit(id).unwrap();
                    prop_assert!(sim.grid().occupants(unit.grid_position).contains(&id));
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_same_seed_same_outcome(seed in any::<u64>(), delta in strategies::arb_delta()) {
        prop_assert!(verify_simulation_determinism(|| siege_sim(seed, 2, 4), 150, delta));
    }
}
