//! Per-tick unit behavior.
//!
//! [`update_unit`] runs one unit for one tick against a read-only view of
//! the world plus the shared targeting cache and RNG. It mutates only the
//! unit it was handed and reports everything else it wants to happen as
//! [`UnitIntent`]s, which the simulation applies in order.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::UnitStats;
use crate::config::SimConfig;
use crate::grid::{Grid, GridCoord};
use crate::math::Fixed;
use crate::player::Player;
use crate::simulation::UnitStorage;
use crate::targeting::TargetingCache;
use crate::unit::{Behavior, Facing, Unit, UnitId};

/// World access handed to each unit update.
pub struct TickContext<'a> {
    /// The grid, for occupancy and terrain.
    pub grid: &'a Grid,
    /// Every unit as of the start of this unit's update.
    pub storage: &'a UnitStorage,
    /// All players, indexed by id.
    pub players: &'a [Player],
    /// Shared nearest-enemy cache.
    pub cache: &'a mut TargetingCache,
    /// Seeded RNG for wander targets.
    pub rng: &'a mut ChaCha8Rng,
    /// Tuning constants and catalog.
    pub config: &'a SimConfig,
    /// Time elapsed this tick.
    pub delta: u32,
}

/// Something a unit wants the simulation to do on its behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitIntent {
    /// Transfer occupancy between adjacent cells.
    Step {
        /// Cell being left.
        from: GridCoord,
        /// Cell being entered.
        to: GridCoord,
    },
    /// Launch a shot at a unit's current cell. Ammunition is already paid.
    Fire {
        /// Unit aimed at.
        target: UnitId,
        /// Where that unit stood when acquired.
        target_coord: GridCoord,
    },
    /// A drill extracted from its cell.
    Mined {
        /// Resources added to the drill's share.
        resources: u32,
        /// Points added to the drill's share.
        points: u32,
    },
}

/// Run one unit for one tick.
///
/// Ghosts and dead units do nothing.
pub fn update_unit(unit: &mut Unit, ctx: &mut TickContext<'_>) -> Vec<UnitIntent> {
    let mut intents = Vec::new();
    if unit.is_ghost() || !unit.is_alive() {
        return intents;
    }

    let stats = ctx.config.catalog.stats(unit.kind);
    if unit.behavior.is_combat_capable() {
        regenerate(unit, ctx);
    }

    let mut behavior = unit.behavior;
    match &mut behavior {
        Behavior::Structure => {}
        Behavior::Combat { shot_cooldown } => {
            if let Some((target, coord)) = acquire_target(unit, ctx) {
                if unit.grid_position.manhattan(coord) <= stats.range {
                    fire_when_ready(unit, shot_cooldown, target, coord, ctx, &mut intents);
                }
            }
        }
        Behavior::Mobile {
            shot_cooldown,
            move_cooldown,
            wander_target,
            facing,
        } => {
            let mut engaged = false;
            let destination = match acquire_target(unit, ctx) {
                Some((target, coord)) => {
                    *wander_target = None;
                    if unit.grid_position.manhattan(coord) <= ctx.config.mob_reach {
                        engaged = true;
                        fire_when_ready(unit, shot_cooldown, target, coord, ctx, &mut intents);
                    }
                    coord
                }
                None => match *wander_target {
                    Some(coord) if coord != unit.grid_position => coord,
                    _ => {
                        let coord = ctx
                            .grid
                            .random_coord_except(&mut *ctx.rng, unit.grid_position)
                            .unwrap_or(unit.grid_position);
                        *wander_target = Some(coord);
                        coord
                    }
                },
            };

            *move_cooldown = move_cooldown.saturating_sub(ctx.delta);
            if !engaged && *move_cooldown == 0 {
                if let Some(next) = step_toward(unit.grid_position, destination, ctx.grid) {
                    let (dx, dy) = unit.grid_position.delta_to(next);
                    intents.push(UnitIntent::Step {
                        from: unit.grid_position,
                        to: next,
                    });
                    unit.grid_position = next;
                    *facing = Facing::from_step(dx, dy);
                    *move_cooldown = move_cost(&stats, next, ctx.grid);
                }
            }
        }
        Behavior::Drill { mine_cooldown } => {
            *mine_cooldown = mine_cooldown.saturating_sub(ctx.delta);
            if *mine_cooldown == 0 {
                *mine_cooldown = ctx.config.mine_interval;
                if let Some(mined) = extract(unit, ctx) {
                    intents.push(mined);
                }
            }
        }
    }
    unit.behavior = behavior;

    intents
}

/// Nearest unit of any other player, searching players in id order.
fn acquire_target(unit: &Unit, ctx: &mut TickContext<'_>) -> Option<(UnitId, GridCoord)> {
    let owner = unit.owner.player()?;
    for enemy in ctx.players.iter().filter(|p| p.id != owner) {
        let found = ctx.cache.find_nearest_owned(
            unit.grid_position,
            enemy.id,
            &enemy.units,
            ctx.grid,
            ctx.storage,
        );
        if let Some(target) = found.and_then(|id| ctx.storage.get(id)) {
            return Some((target.id, target.grid_position));
        }
    }
    None
}

/// Count the shot cooldown down and fire once it reaches zero.
///
/// A unit that cannot pay for ammunition keeps its cooldown at zero and
/// tries again next tick.
fn fire_when_ready(
    unit: &mut Unit,
    cooldown: &mut u32,
    target: UnitId,
    target_coord: GridCoord,
    ctx: &TickContext<'_>,
    intents: &mut Vec<UnitIntent>,
) {
    *cooldown = cooldown.saturating_sub(ctx.delta);
    if *cooldown > 0 {
        return;
    }

    let ammo = if unit.kind.is_mob() {
        0
    } else {
        ctx.config.ammo_cost
    };
    if unit.resources < ammo {
        return;
    }

    unit.resources -= ammo;
    *cooldown = ctx.config.shot_interval;
    intents.push(UnitIntent::Fire {
        target,
        target_coord,
    });
}

/// One greedy grid step toward `destination`.
///
/// The axis with the larger gap wins; ties go to the y axis.
#[must_use]
pub fn step_toward(from: GridCoord, destination: GridCoord, grid: &Grid) -> Option<GridCoord> {
    let (dx, dy) = from.delta_to(destination);
    if dx == 0 && dy == 0 {
        return None;
    }
    let next = if dx.abs() > dy.abs() {
        from.offset(dx.signum(), 0)
    } else {
        from.offset(0, dy.signum())
    };
    grid.in_bounds(next).then_some(next)
}

/// Move cooldown after entering `cell`: base speed scaled by terrain cost.
fn move_cost(stats: &UnitStats, cell: GridCoord, grid: &Grid) -> u32 {
    let cost = grid.movement_cost(cell).unwrap_or(Fixed::ONE);
    (Fixed::from_num(stats.base_speed) * cost)
        .round()
        .to_num::<u32>()
}

fn regenerate(unit: &mut Unit, ctx: &TickContext<'_>) {
    let interval = ctx.config.regen_interval;
    if interval == 0 || unit.health.is_full() {
        unit.regen_timer = 0;
        return;
    }

    unit.regen_timer = unit.regen_timer.saturating_add(ctx.delta);
    while unit.regen_timer >= interval && !unit.health.is_full() {
        unit.regen_timer -= interval;
        unit.health.heal(1);
    }
}

fn extract(unit: &mut Unit, ctx: &TickContext<'_>) -> Option<UnitIntent> {
    let deposits = ctx.grid.cell_at(unit.grid_position)?.terrain().deposits;
    if !deposits.any() {
        return None;
    }

    let yield_amount = ctx.config.drill_yield;
    let resources = if deposits.iron { yield_amount } else { 0 };
    let points = if deposits.crystal { yield_amount } else { 0 };
    unit.resources += resources;
    unit.points += points;
    Some(UnitIntent::Mined { resources, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitCatalog;
    use crate::simulation::UnitSpawnParams;
    use crate::terrain::{TerrainGenerator, TerrainKind};
    use crate::unit::{Owner, UnitKind};
    use rand::SeedableRng;

    struct Fixture {
        grid: Grid,
        storage: UnitStorage,
        players: Vec<Player>,
        cache: TargetingCache,
        rng: ChaCha8Rng,
        config: SimConfig,
    }

    impl Fixture {
        fn new(terrain: TerrainGenerator) -> Self {
            let config = SimConfig {
                terrain,
                ..SimConfig::default()
            };
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            let grid = Grid::new(16, 12, Fixed::from_num(60), &config.terrain, &mut rng);
            Self {
                grid,
                storage: UnitStorage::new(),
                players: vec![Player::new(0, "user"), Player::new(1, "mobs")],
                cache: TargetingCache::new(config.cache_ttl, config.bfs_rounds),
                rng,
                config,
            }
        }

        fn place(&mut self, kind: UnitKind, owner: u32, coord: GridCoord, resources: u32) -> UnitId {
            let params = UnitSpawnParams {
                kind,
                owner: Owner::Player(owner),
                position: coord,
                resources,
                ..Default::default()
            };
            let stats = UnitCatalog::default().stats(kind);
            let id = self.storage.insert(params.build(&stats, &self.config));
            self.grid.add_unit(id, coord);
            self.players[owner as usize].units.push(id);
            id
        }

        fn run(&mut self, id: UnitId, delta: u32) -> (Unit, Vec<UnitIntent>) {
            let mut unit = self.storage.get(id).unwrap().clone();
            let mut ctx = TickContext {
                grid: &self.grid,
                storage: &self.storage,
                players: &self.players,
                cache: &mut self.cache,
                rng: &mut self.rng,
                config: &self.config,
                delta,
            };
            let intents = update_unit(&mut unit, &mut ctx);
            *self.storage.get_mut(id).unwrap() = unit.clone();
            (unit, intents)
        }
    }

    #[test]
    fn test_step_toward_prefers_longer_axis() {
        let f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Grass));
        let from = GridCoord::new(5, 5);
        assert_eq!(step_toward(from, GridCoord::new(9, 6), &f.grid), Some(GridCoord::new(6, 5)));
        assert_eq!(step_toward(from, GridCoord::new(4, 1), &f.grid), Some(GridCoord::new(5, 4)));
        // Tie goes to y.
        assert_eq!(step_toward(from, GridCoord::new(7, 7), &f.grid), Some(GridCoord::new(5, 6)));
        assert_eq!(step_toward(from, from, &f.grid), None);
    }

    #[test]
    fn test_gun_fires_after_cooldown_and_pays_ammo() {
        let mut f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Grass));
        let gun = f.place(UnitKind::GunTower, 0, GridCoord::new(2, 2), 3);
        let mob = f.place(UnitKind::Mob, 1, GridCoord::new(4, 3), 0);

        let (unit, intents) = f.run(gun, 600);
        assert!(intents.is_empty());
        assert_eq!(unit.resources, 3);

        let (unit, intents) = f.run(gun, 400);
        assert_eq!(
            intents,
            vec![UnitIntent::Fire {
                target: mob,
                target_coord: GridCoord::new(4, 3)
            }]
        );
        assert_eq!(unit.resources, 2);
        assert_eq!(unit.behavior, Behavior::Combat { shot_cooldown: 1000 });
    }

    #[test]
    fn test_gun_without_ammo_holds_fire() {
        let mut f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Grass));
        let gun = f.place(UnitKind::GunTower, 0, GridCoord::new(2, 2), 0);
        f.place(UnitKind::Mob, 1, GridCoord::new(3, 2), 0);

        let (unit, intents) = f.run(gun, 1000);
        assert!(intents.is_empty());
        assert_eq!(unit.behavior, Behavior::Combat { shot_cooldown: 0 });
    }

    #[test]
    fn test_gun_ignores_targets_out_of_range() {
        let mut f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Grass));
        let gun = f.place(UnitKind::GunTower, 0, GridCoord::new(0, 0), 5);
        f.place(UnitKind::Mob, 1, GridCoord::new(5, 5), 0);

        let (unit, intents) = f.run(gun, 1000);
        assert!(intents.is_empty());
        assert_eq!(unit.behavior, Behavior::Combat { shot_cooldown: 1000 });
    }

    #[test]
    fn test_mob_fires_free_when_adjacent() {
        let mut f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Grass));
        let wall = f.place(UnitKind::WallTower, 0, GridCoord::new(5, 5), 0);
        let mob = f.place(UnitKind::Mob, 1, GridCoord::new(6, 6), 0);

        let (unit, intents) = f.run(mob, 1000);
        assert_eq!(
            intents,
            vec![UnitIntent::Fire {
                target: wall,
                target_coord: GridCoord::new(5, 5)
            }]
        );
        assert_eq!(unit.grid_position, GridCoord::new(6, 6));
    }

    #[test]
    fn test_mob_walks_toward_distant_enemy() {
        let mut f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Swamp));
        f.place(UnitKind::WallTower, 0, GridCoord::new(2, 5), 0);
        let mob = f.place(UnitKind::Mob, 1, GridCoord::new(8, 5), 0);

        let (unit, intents) = f.run(mob, 800);
        assert_eq!(
            intents,
            vec![UnitIntent::Step {
                from: GridCoord::new(8, 5),
                to: GridCoord::new(7, 5)
            }]
        );
        assert_eq!(unit.facing(), Facing::West);
        // Swamp doubles the base cooldown.
        match unit.behavior {
            Behavior::Mobile { move_cooldown, .. } => assert_eq!(move_cooldown, 1600),
            other => panic!("unexpected behavior {other:?}"),
        }
    }

    #[test]
    fn test_drill_yields_per_deposit() {
        let mut f = Fixture::new(TerrainGenerator::Banded);
        // Banded terrain puts both deposits on the origin.
        let drill = f.place(UnitKind::DrillTower, 0, GridCoord::new(0, 0), 0);

        let (_, intents) = f.run(drill, 999);
        assert!(intents.is_empty());
        let (unit, intents) = f.run(drill, 1);
        assert_eq!(intents, vec![UnitIntent::Mined { resources: 2, points: 2 }]);
        assert_eq!(unit.resources, 2);
        assert_eq!(unit.points, 2);
    }

    #[test]
    fn test_regeneration_only_when_hurt() {
        let mut f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Grass));
        let gun = f.place(UnitKind::GunTower, 0, GridCoord::new(2, 2), 0);
        f.storage.get_mut(gun).unwrap().health.current = 98;

        let (unit, _) = f.run(gun, 4000);
        assert_eq!(unit.health.current, 99);
        let (unit, _) = f.run(gun, 3999);
        assert_eq!(unit.health.current, 99);
        let (unit, _) = f.run(gun, 1);
        assert_eq!(unit.health.current, 100);
        assert_eq!(unit.regen_timer, 0);
    }

    #[test]
    fn test_ghost_never_acts() {
        let mut f = Fixture::new(TerrainGenerator::Uniform(TerrainKind::Grass));
        let gun = f.place(UnitKind::GunTower, 0, GridCoord::new(2, 2), 5);
        f.place(UnitKind::Mob, 1, GridCoord::new(2, 3), 0);
        f.storage.get_mut(gun).unwrap().owner = Owner::Ghost(0);

        let (unit, intents) = f.run(gun, 5000);
        assert!(intents.is_empty());
        assert_eq!(unit.behavior, Behavior::Combat { shot_cooldown: 1000 });
    }
}
