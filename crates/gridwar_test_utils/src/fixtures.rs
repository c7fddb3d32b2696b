//! Test fixtures and helpers.
//!
//! Pre-built boards and unit placements for consistent testing.

use fixed::types::I32F32;
use gridwar_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Pixel position from whole pixel values.
#[must_use]
pub fn px(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Default 16x12 board with flat grass and no deposits.
#[must_use]
pub fn flat_config() -> SimConfig {
    SimConfig {
        terrain: TerrainGenerator::Uniform(TerrainKind::Grass),
        ..SimConfig::default()
    }
}

/// Flat board with a user (player 0) and a hostile mob player (player 1).
///
/// # Panics
///
/// Panics if the default config is rejected, which would be a bug.
#[must_use]
pub fn two_player_sim() -> (Simulation, PlayerId, PlayerId) {
    let mut sim = Simulation::new(flat_config()).expect("flat config is valid");
    let user = sim.add_player("user");
    let mobs = sim.add_player("mobs");
    (sim, user, mobs)
}

/// Force-place a unit, bypassing its cost.
///
/// # Panics
///
/// Panics if the placement is rejected (off-grid coordinate or unknown player).
pub fn place(
    sim: &mut Simulation,
    kind: UnitKind,
    owner: PlayerId,
    x: i32,
    y: i32,
    resources: u32,
) -> UnitId {
    sim.create_unit(UnitSpawnParams {
        kind,
        owner: Owner::Player(owner),
        position: GridCoord::new(x, y),
        force: true,
        resources,
        ..Default::default()
    })
    .expect("fixture placement must succeed")
}

/// A board with a defended base on the left and mobs streaming in on the
/// right, for determinism and benchmark runs.
///
/// `towers` gun towers are stacked in column 2 and `mobs` mobs in column
/// 14, wrapping over rows. A spawn timer keeps adding mobs.
#[must_use]
pub fn siege_sim(seed: u64, towers: u32, mobs: u32) -> Simulation {
    let config = SimConfig {
        seed,
        terrain: TerrainGenerator::Banded,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).expect("siege config is valid");
    let user = sim.add_player("user");
    let hostile = sim.add_player("mobs");
    let rows = sim.grid().height() as i32;

    place(&mut sim, UnitKind::ControlTower, user, 1, rows / 2, 500);
    place(&mut sim, UnitKind::DrillTower, user, 0, 0, 0);
    for i in 0..towers as i32 {
        place(&mut sim, UnitKind::GunTower, user, 2 + i / rows, i % rows, 20);
    }
    for i in 0..mobs as i32 {
        place(&mut sim, UnitKind::Mob, hostile, 14 - i / rows, i % rows, 0);
    }
    sim.schedule_enemy_spawns(hostile, None);
    sim
}
