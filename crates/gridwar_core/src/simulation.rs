//! Core simulation loop.
//!
//! [`Simulation`] owns the grid, every unit, every player, the link
//! network, in-flight shots and timers, and advances them together one tick
//! at a time.
//!
//! # Determinism
//!
//! - No floating-point math (pixel space uses [`Fixed`])
//! - One seeded RNG, drawn from in a fixed order
//! - Units update in ascending id order; players in ascending id order
//! - Same config, seed and inputs always produce the same [`Simulation::state_hash`]
//!
//! # Example
//!
//! ```
//! use gridwar_core::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! let user = sim.add_player("user");
//!
//! let control = sim
//!     .create_unit(UnitSpawnParams {
//!         kind: UnitKind::ControlTower,
//!         owner: Owner::Player(user),
//!         position: GridCoord::new(1, 1),
//!         force: true,
//!         resources: 500,
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let events = sim.tick(50);
//! assert!(events.deaths.is_empty());
//! assert_eq!(sim.total_resources(user), 500);
//! assert!(sim.unit(control).is_some());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::behavior::{update_unit, TickContext, UnitIntent};
use crate::catalog::UnitStats;
use crate::config::SimConfig;
use crate::economy;
use crate::edges::LinkNetwork;
use crate::error::{GameError, Result};
use crate::grid::{Grid, GridCoord};
use crate::math::{Fixed, Vec2Fixed};
use crate::player::{Player, PlayerId};
use crate::shot::{Shot, ShotId, ShotParams, ShotStatus};
use crate::targeting::TargetingCache;
use crate::timers::{TimerAction, TimerId, TimerQueue};
use crate::unit::{Behavior, Health, Owner, Unit, UnitId, UnitKind};

/// Parameters for creating a unit.
///
/// Use struct update syntax with `..Default::default()` for the fields you
/// don't care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSpawnParams {
    /// Catalog kind.
    pub kind: UnitKind,
    /// Owning player, or ghost sentinel for a preview.
    pub owner: Owner,
    /// Cell to place the unit on.
    pub position: GridCoord,
    /// Skip the resource cost (scripted and initial placement).
    pub force: bool,
    /// Starting resource share. Ignored for ghosts.
    pub resources: u32,
    /// Starting point share. Ignored for ghosts.
    pub points: u32,
}

impl Default for UnitSpawnParams {
    fn default() -> Self {
        Self {
            kind: UnitKind::WallTower,
            owner: Owner::Player(0),
            position: GridCoord::default(),
            force: false,
            resources: 0,
            points: 0,
        }
    }
}

impl UnitSpawnParams {
    /// Build the unit record. The id is assigned on insertion.
    #[must_use]
    pub fn build(&self, stats: &UnitStats, config: &SimConfig) -> Unit {
        let ghost = self.owner.is_ghost();
        Unit {
            id: 0,
            kind: self.kind,
            owner: self.owner,
            grid_position: self.position,
            health: Health::new(stats.max_health),
            resources: if ghost { 0 } else { self.resources },
            points: if ghost { 0 } else { self.points },
            regen_timer: 0,
            link_count: 0,
            link_radius: stats.link_radius,
            behavior: Behavior::from_template(stats, config.shot_interval, config.mine_interval),
        }
    }
}

/// Id-indexed unit arena.
///
/// Ordered by id, so iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct UnitStorage {
    units: BTreeMap<UnitId, Unit>,
    next_id: UnitId,
}

impl UnitStorage {
    /// Create empty storage. Ids start at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert a unit, assigning and returning its id.
    pub fn insert(&mut self, mut unit: Unit) -> UnitId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        unit.id = id;
        self.units.insert(id, unit);
        id
    }

    /// Remove a unit by id.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable reference to a unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit exists.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of units, ghosts included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit ids in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Iterate over units in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

/// Damage dealt to one unit by one shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// Shot that landed.
    pub shot: ShotId,
    /// Unit that was hit.
    pub target: UnitId,
    /// Health actually removed.
    pub amount: u32,
}

/// A shot reaching its aim point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impact {
    /// Shot that landed.
    pub shot: ShotId,
    /// Cell under the landing point, if on the grid.
    pub cell: Option<GridCoord>,
}

/// A drill extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningEvent {
    /// Drill that mined.
    pub unit: UnitId,
    /// Resources extracted.
    pub resources: u32,
    /// Points extracted.
    pub points: u32,
}

/// A unit created by a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnEvent {
    /// New unit.
    pub unit: UnitId,
    /// Player it was created for.
    pub owner: PlayerId,
}

/// A one-cell move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    /// Unit that moved.
    pub unit: UnitId,
    /// Cell left.
    pub from: GridCoord,
    /// Cell entered.
    pub to: GridCoord,
}

/// Events generated during a simulation tick.
///
/// These events can be used by the host to trigger effects, sounds,
/// animations, etc.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Shots launched this tick.
    pub shots_fired: Vec<ShotId>,
    /// Shots that reached their aim point.
    pub impacts: Vec<Impact>,
    /// Damage from impacts.
    pub damage_events: Vec<DamageEvent>,
    /// Units destroyed this tick.
    pub deaths: Vec<UnitId>,
    /// Units created by timers this tick.
    pub spawned: Vec<SpawnEvent>,
    /// Drill extractions.
    pub mined: Vec<MiningEvent>,
    /// Mobile unit steps.
    pub moves: Vec<MoveEvent>,
}

/// The grid simulation.
///
/// # Tick Order
///
/// 1. **Timers** - scheduled actions (enemy spawns)
/// 2. **Units** - each live unit in id order: regen, targeting, movement,
///    firing, mining
/// 3. **Shots** - advance, resolve impacts, apply damage
/// 4. **Health** - destroy anything left at zero health
/// 5. **Economy** - every player rebalances resources and points
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    tick: u64,
    elapsed: u64,
    grid: Grid,
    units: UnitStorage,
    players: Vec<Player>,
    edges: LinkNetwork,
    shots: Vec<Shot>,
    next_shot_id: ShotId,
    cache: TargetingCache,
    timers: TimerQueue,
    rng: ChaCha8Rng,
    active_player: PlayerId,
}

impl Simulation {
    /// Create a simulation with an empty grid and no players.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the config fails validation.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::new(
            config.grid_width,
            config.grid_height,
            config.cell_size,
            &config.terrain,
            &mut rng,
        );
        let cache = TargetingCache::new(config.cache_ttl, config.bfs_rounds);

        Ok(Self {
            config,
            tick: 0,
            elapsed: 0,
            grid,
            units: UnitStorage::new(),
            players: Vec::new(),
            edges: LinkNetwork::new(),
            shots: Vec::new(),
            next_shot_id: 1,
            cache,
            timers: TimerQueue::new(),
            rng,
            active_player: 0,
        })
    }

    /// Current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Total time simulated so far.
    #[must_use]
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Tuning constants.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The unit arena.
    #[must_use]
    pub const fn units(&self) -> &UnitStorage {
        &self.units
    }

    /// A unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// All players, indexed by id.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// A player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::PlayerNotFound(id))
    }

    /// The link network.
    #[must_use]
    pub const fn edges(&self) -> &LinkNetwork {
        &self.edges
    }

    /// Shots in flight.
    #[must_use]
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// The targeting cache.
    #[must_use]
    pub const fn targeting(&self) -> &TargetingCache {
        &self.cache
    }

    /// Mutable targeting cache, for the debug-halt switch.
    pub fn targeting_mut(&mut self) -> &mut TargetingCache {
        &mut self.cache
    }

    /// Player whose pan offset drives shots and rendering.
    #[must_use]
    pub const fn active_player(&self) -> PlayerId {
        self.active_player
    }

    /// Choose the player whose view drives shots and rendering.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerNotFound`] for an unknown id.
    pub fn set_active_player(&mut self, id: PlayerId) -> Result<()> {
        self.player_mut(id)?;
        self.active_player = id;
        Ok(())
    }

    fn active_pan(&self) -> Vec2Fixed {
        self.player(self.active_player)
            .map_or(Vec2Fixed::ZERO, |p| p.pan_offset)
    }

    /// Register a player. Ids are handed out from 0 upward.
    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let id = self.players.len() as PlayerId;
        let mut player = Player::new(id, name);
        player.revealed = self.config.initial_visible.iter().copied().collect();
        self.players.push(player);
        info!(player = id, name, "player registered");
        id
    }

    /// Shift a player's camera pan by `delta` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerNotFound`] for an unknown id.
    pub fn pan_camera(&mut self, player: PlayerId, delta: Vec2Fixed) -> Result<()> {
        self.player_mut(player)?.pan_offset += delta;
        Ok(())
    }

    /// Pixel centre of a unit's cell as seen by the active player.
    #[must_use]
    pub fn unit_pixel_center(&self, id: UnitId) -> Option<Vec2Fixed> {
        let unit = self.units.get(id)?;
        Some(
            self.grid
                .grid_to_pixel_center(unit.grid_position, self.active_pan()),
        )
    }

    /// Check whether a player can see a cell.
    ///
    /// A cell is visible if it was revealed up front or lies within the
    /// vision range (Manhattan) of one of the player's units.
    #[must_use]
    pub fn is_cell_visible(&self, player: PlayerId, coord: GridCoord) -> bool {
        if !self.grid.in_bounds(coord) {
            return false;
        }
        let Some(player) = self.player(player) else {
            return false;
        };
        if player.revealed.contains(&coord) {
            return true;
        }
        player
            .units
            .iter()
            .filter_map(|&id| self.units.get(id))
            .any(|u| u.grid_position.manhattan(coord) <= self.config.catalog.stats(u.kind).vision)
    }

    // ---------------------------------------------------------------------
    // Economy
    // ---------------------------------------------------------------------

    /// Sum of a player's resource shares (0 for an unknown player).
    #[must_use]
    pub fn total_resources(&self, player: PlayerId) -> u32 {
        self.player(player)
            .map_or(0, |p| economy::total_resources(&p.units, &self.units))
    }

    /// Sum of a player's point shares (0 for an unknown player).
    #[must_use]
    pub fn total_points(&self, player: PlayerId) -> u32 {
        self.player(player)
            .map_or(0, |p| economy::total_points(&p.units, &self.units))
    }

    /// Take `amount` from a player's pool; `false` and no change if short.
    pub fn spend_resources(&mut self, player: PlayerId, amount: u32) -> bool {
        match self.players.get(player as usize) {
            Some(p) => economy::spend_resources(&p.units, &mut self.units, amount),
            None => false,
        }
    }

    /// Rebalance a player's resource shares.
    pub fn redistribute_resources(&mut self, player: PlayerId) {
        if let Some(p) = self.players.get(player as usize) {
            economy::redistribute_resources(&p.units, &mut self.units);
        }
    }

    /// Move a player's points onto their control structures.
    pub fn redistribute_points(&mut self, player: PlayerId) {
        if let Some(p) = self.players.get(player as usize) {
            economy::redistribute_points(&p.units, &mut self.units);
        }
    }

    // ---------------------------------------------------------------------
    // Unit lifecycle
    // ---------------------------------------------------------------------

    /// Create a unit, link it, and charge its owner unless `force` is set.
    ///
    /// Ghost units are never charged and never occupy a cell.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidCoordinate`] if the position is off the grid
    /// - [`GameError::PlayerNotFound`] for an unknown owner
    /// - [`GameError::InsufficientResources`] if the owner cannot pay; the
    ///   unit is torn down again before returning
    pub fn create_unit(&mut self, params: UnitSpawnParams) -> Result<UnitId> {
        if !self.grid.in_bounds(params.position) {
            warn!(kind = %params.kind, position = %params.position, "placement off the grid");
            return Err(GameError::InvalidCoordinate(params.position));
        }
        let viewer = params.owner.viewer();
        self.player_mut(viewer)?;

        let stats = self.config.catalog.stats(params.kind);
        let id = self.units.insert(params.build(&stats, &self.config));

        if let Owner::Player(owner) = params.owner {
            self.grid.add_unit(id, params.position);
            self.player_mut(owner)?.units.push(id);
        }
        self.link_unit(id);

        if let Owner::Player(owner) = params.owner {
            if !params.force {
                let available = self.total_resources(owner);
                if !self.spend_resources(owner, stats.cost) {
                    self.destroy_unit(id)?;
                    warn!(
                        kind = %params.kind,
                        required = stats.cost,
                        available,
                        "placement rejected"
                    );
                    return Err(GameError::InsufficientResources {
                        required: stats.cost,
                        available,
                    });
                }
            }
            info!(unit = id, kind = %params.kind, owner, position = %params.position, "unit created");
        } else {
            debug!(unit = id, kind = %params.kind, position = %params.position, "ghost created");
        }

        Ok(id)
    }

    /// Link a unit to every unit of its player within combined link radius.
    fn link_unit(&mut self, id: UnitId) {
        let Some(unit) = self.units.get(id) else {
            return;
        };
        if unit.kind.is_mob() {
            return;
        }
        let Some(player) = self.players.get(unit.owner.viewer() as usize) else {
            return;
        };

        let ghost = unit.is_ghost();
        let center = self.grid.grid_to_pixel_center(unit.grid_position, Vec2Fixed::ZERO);
        let partners: Vec<UnitId> = player
            .units
            .iter()
            .filter(|&&other| other != id)
            .filter_map(|&other| self.units.get(other))
            .filter(|other| !other.kind.is_mob())
            .filter(|other| {
                let reach = Fixed::from_num(unit.link_radius + other.link_radius);
                let other_center = self
                    .grid
                    .grid_to_pixel_center(other.grid_position, Vec2Fixed::ZERO);
                center.distance(other_center) <= reach
            })
            .map(|other| other.id)
            .collect();

        for partner in partners {
            if self.edges.add_edge(partner, id, ghost) {
                for end in [partner, id] {
                    if let Some(u) = self.units.get_mut(end) {
                        u.link_count += 1;
                    }
                }
            }
        }
    }

    fn unlink_unit(&mut self, id: UnitId) {
        for other in self.edges.remove_all_edges_from_unit(id) {
            if let Some(u) = self.units.get_mut(other) {
                u.link_count = u.link_count.saturating_sub(1);
            }
        }
        if let Some(u) = self.units.get_mut(id) {
            u.link_count = 0;
        }
    }

    /// Tear a unit down: edges, cell, player roster, then the arena.
    ///
    /// The unit's resource and point shares are lost with it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit does not exist.
    pub fn destroy_unit(&mut self, id: UnitId) -> Result<()> {
        let (owner, position, kind) = self
            .units
            .get(id)
            .map(|u| (u.owner, u.grid_position, u.kind))
            .ok_or(GameError::UnitNotFound(id))?;

        self.unlink_unit(id);
        match owner {
            Owner::Player(p) => {
                self.grid.remove_unit(id, position);
                if let Some(player) = self.players.get_mut(p as usize) {
                    player.remove_unit(id);
                }
                info!(unit = id, kind = %kind, owner = p, "unit destroyed");
            }
            Owner::Ghost(p) => {
                if let Some(player) = self.players.get_mut(p as usize) {
                    if player.ghost == Some(id) {
                        player.ghost = None;
                    }
                }
                debug!(unit = id, "ghost removed");
            }
        }
        self.units.remove(id);
        Ok(())
    }

    /// Damage a unit, destroying it if its health reaches zero.
    ///
    /// Ghosts ignore damage. Returns the health actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit does not exist.
    pub fn apply_damage(&mut self, id: UnitId, amount: u32) -> Result<u32> {
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        if unit.is_ghost() {
            return Ok(0);
        }
        let dealt = unit.health.apply_damage(amount);
        if unit.health.is_dead() {
            self.destroy_unit(id)?;
        }
        Ok(dealt)
    }

    /// Re-place a ghost on another cell and relink its preview edges.
    pub(crate) fn move_ghost(&mut self, id: UnitId, coord: GridCoord) {
        if !self.grid.in_bounds(coord) {
            return;
        }
        self.unlink_unit(id);
        if let Some(u) = self.units.get_mut(id) {
            if !u.is_ghost() {
                return;
            }
            u.grid_position = coord;
        }
        self.link_unit(id);
    }

    // ---------------------------------------------------------------------
    // Timers
    // ---------------------------------------------------------------------

    /// Schedule an action on the tick clock.
    pub fn add_timer(&mut self, interval: u32, repeats: bool, action: TimerAction) -> TimerId {
        self.timers.add(interval, repeats, action)
    }

    /// Cancel a scheduled action.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Spawn a mob for `owner` every configured spawn interval.
    pub fn schedule_enemy_spawns(&mut self, owner: PlayerId, at: Option<GridCoord>) -> TimerId {
        let interval = self.config.spawn_interval;
        self.add_timer(interval, true, TimerAction::SpawnMob { owner, at })
    }

    fn run_timer_action(&mut self, action: TimerAction, events: &mut TickEvents) {
        match action {
            TimerAction::SpawnMob { owner, at } => {
                let position = at.unwrap_or_else(|| self.grid.random_coord(&mut self.rng));
                let params = UnitSpawnParams {
                    kind: UnitKind::Mob,
                    owner: Owner::Player(owner),
                    position,
                    force: true,
                    ..Default::default()
                };
                match self.create_unit(params) {
                    Ok(unit) => events.spawned.push(SpawnEvent { unit, owner }),
                    Err(e) => warn!(error = %e, "mob spawn skipped"),
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Tick
    // ---------------------------------------------------------------------

    /// Advance the simulation by `delta` time units.
    ///
    /// Returns events generated during this tick for use by the host.
    pub fn tick(&mut self, delta: u32) -> TickEvents {
        let mut events = TickEvents::default();

        // 1. Timers
        for action in self.timers.advance(delta) {
            self.run_timer_action(action, &mut events);
        }

        // 2. Units
        let fired_by = self.run_units(delta, &mut events);
        for player in fired_by {
            self.redistribute_resources(player);
        }

        // 3. Shots
        self.run_shots(delta, &mut events);

        // 4. Health
        let dead: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| !u.is_ghost() && !u.is_alive())
            .map(|u| u.id)
            .collect();
        for id in dead {
            if self.destroy_unit(id).is_ok() {
                events.deaths.push(id);
            }
        }

        // 5. Economy
        for player in 0..self.players.len() as PlayerId {
            self.redistribute_resources(player);
            self.redistribute_points(player);
        }

        self.tick += 1;
        self.elapsed += u64::from(delta);

        #[cfg(debug_assertions)]
        debug!(tick = self.tick, state_hash = self.state_hash(), "tick complete");

        events
    }

    /// Update every live unit and apply its intents. Returns the players
    /// whose units fired.
    fn run_units(&mut self, delta: u32, events: &mut TickEvents) -> BTreeSet<PlayerId> {
        let mut fired_by = BTreeSet::new();

        for id in self.units.sorted_ids() {
            let Some(mut unit) = self.units.get(id).cloned() else {
                continue;
            };
            if unit.is_ghost() {
                continue;
            }

            let intents = {
                let mut ctx = TickContext {
                    grid: &self.grid,
                    storage: &self.units,
                    players: &self.players,
                    cache: &mut self.cache,
                    rng: &mut self.rng,
                    config: &self.config,
                    delta,
                };
                update_unit(&mut unit, &mut ctx)
            };

            for intent in intents {
                match intent {
                    UnitIntent::Step { from, to } => {
                        self.grid.move_unit(id, from, to);
                        events.moves.push(MoveEvent { unit: id, from, to });
                    }
                    UnitIntent::Fire {
                        target,
                        target_coord,
                    } => {
                        let shot = self.spawn_shot(&unit, target, target_coord);
                        events.shots_fired.push(shot);
                        if let Some(owner) = unit.owner.player() {
                            fired_by.insert(owner);
                        }
                    }
                    UnitIntent::Mined { resources, points } => {
                        events.mined.push(MiningEvent {
                            unit: id,
                            resources,
                            points,
                        });
                    }
                }
            }

            if let Some(slot) = self.units.get_mut(id) {
                *slot = unit;
            }
        }

        fired_by
    }

    fn spawn_shot(&mut self, source: &Unit, target: UnitId, target_coord: GridCoord) -> ShotId {
        let pan = self.active_pan();
        let id = self.next_shot_id;
        self.next_shot_id += 1;

        let shot = Shot::new(
            id,
            ShotParams {
                source: source.id,
                target_unit: Some(target),
                owner: source.owner.viewer(),
                kind: self.config.catalog.stats(source.kind).shot_kind,
                origin: self.grid.grid_to_pixel_center(source.grid_position, pan),
                target: self.grid.grid_to_pixel_center(target_coord, pan),
                speed: self.config.shot_speed,
                pan,
            },
        );
        debug!(shot = id, source = source.id, target, "shot fired");
        self.shots.push(shot);
        id
    }

    /// Launch a shot between two pixel positions, outside of unit updates.
    ///
    /// The shot is attributed to `source` and flies like any other.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if `source` does not exist.
    pub fn fire_shot(
        &mut self,
        source: UnitId,
        origin: Vec2Fixed,
        target: Vec2Fixed,
    ) -> Result<ShotId> {
        let unit = self.units.get(source).ok_or(GameError::UnitNotFound(source))?;
        let pan = self.active_pan();
        let id = self.next_shot_id;
        self.next_shot_id += 1;

        self.shots.push(Shot::new(
            id,
            ShotParams {
                source,
                target_unit: None,
                owner: unit.owner.viewer(),
                kind: self.config.catalog.stats(unit.kind).shot_kind,
                origin,
                target,
                speed: self.config.shot_speed,
                pan,
            },
        ));
        Ok(id)
    }

    fn run_shots(&mut self, delta: u32, events: &mut TickEvents) {
        let pan = self.active_pan();
        let threshold = self.config.collision_threshold;

        let mut landed = Vec::new();
        self.shots.retain_mut(|shot| match shot.advance(delta, pan, threshold) {
            ShotStatus::InFlight => true,
            ShotStatus::Arrived(position) => {
                landed.push((shot.id, position));
                false
            }
        });

        for (shot, position) in landed {
            let cell = self.grid.pixel_to_grid(position, pan);
            events.impacts.push(Impact { shot, cell });
            let Some(cell) = cell else {
                continue;
            };

            for target in self.grid.occupants(cell) {
                match self.apply_damage(target, 1) {
                    Ok(amount) => {
                        events.damage_events.push(DamageEvent {
                            shot,
                            target,
                            amount,
                        });
                        if !self.units.contains(target) {
                            events.deaths.push(target);
                        }
                    }
                    Err(e) => warn!(error = %e, shot, "impact on missing unit"),
                }
            }
            debug!(shot, cell = %cell, "shot landed");
        }
    }

    /// Hash of the full simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.units.len().hash(&mut hasher);
        for unit in self.units.iter() {
            unit.hash(&mut hasher);
        }
        for player in &self.players {
            player.id.hash(&mut hasher);
            player.units.hash(&mut hasher);
            player.pan_offset.hash(&mut hasher);
            player.ghost.hash(&mut hasher);
        }
        self.edges.hash(&mut hasher);
        self.shots.hash(&mut hasher);
        self.timers.hash(&mut hasher);

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{TerrainGenerator, TerrainKind};

    fn sim() -> Simulation {
        let config = SimConfig {
            terrain: TerrainGenerator::Uniform(TerrainKind::Grass),
            ..SimConfig::default()
        };
        Simulation::new(config).unwrap()
    }

    fn place(sim: &mut Simulation, kind: UnitKind, owner: PlayerId, x: i32, y: i32, resources: u32) -> UnitId {
        sim.create_unit(UnitSpawnParams {
            kind,
            owner: Owner::Player(owner),
            position: GridCoord::new(x, y),
            force: true,
            resources,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_simulation_new() {
        let sim = sim();
        assert_eq!(sim.get_tick(), 0);
        assert!(sim.units().is_empty());
        assert_eq!(sim.grid().width(), 16);
    }

    #[test]
    fn test_new_rejects_unworkable_config() {
        let huge_cells = SimConfig {
            cell_size: Fixed::from_num(2_000_000_000),
            ..SimConfig::default()
        };
        assert!(matches!(Simulation::new(huge_cells), Err(GameError::InvalidState(_))));

        let no_threshold = SimConfig {
            collision_threshold: Fixed::ZERO,
            ..SimConfig::default()
        };
        assert!(matches!(Simulation::new(no_threshold), Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_unit_ids_are_sequential() {
        let mut sim = sim();
        let p = sim.add_player("user");
        let a = place(&mut sim, UnitKind::WallTower, p, 0, 0, 0);
        let b = place(&mut sim, UnitKind::WallTower, p, 5, 5, 0);
        assert_eq!(b, a + 1);
        assert_eq!(sim.player(p).unwrap().units, vec![a, b]);
    }

    #[test]
    fn test_create_off_grid_fails() {
        let mut sim = sim();
        let p = sim.add_player("user");
        let err = sim
            .create_unit(UnitSpawnParams {
                owner: Owner::Player(p),
                position: GridCoord::new(16, 0),
                force: true,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, GameError::InvalidCoordinate(GridCoord::new(16, 0)));
        assert!(sim.units().is_empty());
    }

    #[test]
    fn test_create_unknown_player_fails() {
        let mut sim = sim();
        let err = sim
            .create_unit(UnitSpawnParams {
                owner: Owner::Player(3),
                force: true,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, GameError::PlayerNotFound(3));
    }

    #[test]
    fn test_unaffordable_unit_is_torn_down() {
        let mut sim = sim();
        let p = sim.add_player("user");
        let control = place(&mut sim, UnitKind::ControlTower, p, 1, 1, 40);

        let err = sim
            .create_unit(UnitSpawnParams {
                kind: UnitKind::GunTower,
                owner: Owner::Player(p),
                position: GridCoord::new(2, 1),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientResources {
                required: 100,
                available: 40
            }
        );
        assert_eq!(sim.player(p).unwrap().units, vec![control]);
        assert!(sim.grid().cell_at(GridCoord::new(2, 1)).unwrap().is_vacant());
        assert!(sim.edges().is_empty());
        assert_eq!(sim.unit(control).unwrap().link_count, 0);
        assert_eq!(sim.total_resources(p), 40);
    }

    #[test]
    fn test_links_within_combined_radius() {
        let mut sim = sim();
        let p = sim.add_player("user");
        let a = place(&mut sim, UnitKind::WallTower, p, 0, 0, 0);
        // 60 px apart, well under 100 + 100.
        let b = place(&mut sim, UnitKind::WallTower, p, 1, 0, 0);
        // 240 px from b and 300 px from a: out of reach for both.
        let c = place(&mut sim, UnitKind::WallTower, p, 5, 0, 0);

        assert!(sim.edges().linked(a, b));
        assert!(!sim.edges().linked(b, c));
        assert!(!sim.edges().linked(a, c));
        assert_eq!(sim.unit(a).unwrap().link_count, 1);
        assert_eq!(sim.unit(c).unwrap().link_count, 0);
    }

    #[test]
    fn test_mobs_never_link() {
        let mut sim = sim();
        let p = sim.add_player("mobs");
        place(&mut sim, UnitKind::Mob, p, 0, 0, 0);
        place(&mut sim, UnitKind::Mob, p, 1, 0, 0);
        assert!(sim.edges().is_empty());
    }

    #[test]
    fn test_destroy_tears_down_everything() {
        let mut sim = sim();
        let p = sim.add_player("user");
        let a = place(&mut sim, UnitKind::WallTower, p, 3, 3, 0);
        let b = place(&mut sim, UnitKind::WallTower, p, 3, 4, 0);

        sim.destroy_unit(b).unwrap();

        assert!(sim.edges().edges().iter().all(|e| !e.touches(b)));
        assert_eq!(sim.unit(a).unwrap().link_count, 0);
        assert!(sim.grid().cell_at(GridCoord::new(3, 4)).unwrap().is_vacant());
        assert!(!sim.player(p).unwrap().owns(b));
        assert_eq!(sim.destroy_unit(b), Err(GameError::UnitNotFound(b)));
    }

    #[test]
    fn test_lethal_damage_destroys_immediately() {
        let mut sim = sim();
        let p = sim.add_player("mobs");
        let mob = place(&mut sim, UnitKind::Mob, p, 2, 2, 0);
        assert_eq!(sim.apply_damage(mob, 5).unwrap(), 5);
        assert_eq!(sim.apply_damage(mob, 100).unwrap(), 15);
        assert!(sim.unit(mob).is_none());
    }

    #[test]
    fn test_tower_kills_adjacent_mob() {
        let mut sim = sim();
        let user = sim.add_player("user");
        let mobs = sim.add_player("mobs");
        place(&mut sim, UnitKind::GunTower, user, 4, 4, 100);
        let mob = place(&mut sim, UnitKind::Mob, mobs, 5, 4, 0);

        let mut died = false;
        for _ in 0..2000 {
            let events = sim.tick(50);
            if events.deaths.contains(&mob) {
                died = true;
                break;
            }
        }
        assert!(died);
        assert!(sim.unit(mob).is_none());
    }

    #[test]
    fn test_points_flow_to_control() {
        let mut sim = sim();
        let p = sim.add_player("user");
        let control = place(&mut sim, UnitKind::ControlTower, p, 0, 0, 0);
        let wall = sim
            .create_unit(UnitSpawnParams {
                kind: UnitKind::WallTower,
                owner: Owner::Player(p),
                position: GridCoord::new(1, 0),
                force: true,
                points: 9,
                ..Default::default()
            })
            .unwrap();

        sim.tick(10);
        assert_eq!(sim.unit(control).unwrap().points, 9);
        assert_eq!(sim.unit(wall).unwrap().points, 0);
    }

    #[test]
    fn test_visibility() {
        let mut sim = sim();
        let p = sim.add_player("user");
        // Revealed up front.
        assert!(sim.is_cell_visible(p, GridCoord::new(0, 1)));
        assert!(!sim.is_cell_visible(p, GridCoord::new(8, 8)));

        // Watch tower sees five cells.
        place(&mut sim, UnitKind::WatchTower, p, 8, 4, 0);
        assert!(sim.is_cell_visible(p, GridCoord::new(8, 8)));
        assert!(sim.is_cell_visible(p, GridCoord::new(11, 6)));
        assert!(!sim.is_cell_visible(p, GridCoord::new(12, 6)));
        assert!(!sim.is_cell_visible(p, GridCoord::new(-1, 4)));
    }

    #[test]
    fn test_spawn_timer_creates_mobs() {
        let mut sim = sim();
        sim.add_player("user");
        let mobs = sim.add_player("mobs");
        sim.schedule_enemy_spawns(mobs, Some(GridCoord::new(15, 11)));

        let mut spawned = Vec::new();
        for _ in 0..100 {
            spawned.extend(sim.tick(100).spawned);
        }
        // 10 000 time units at one spawn per 5000.
        assert_eq!(spawned.len(), 2);
        for spawn in spawned {
            assert_eq!(spawn.owner, mobs);
            assert_eq!(sim.unit(spawn.unit).map(|u| u.kind), Some(UnitKind::Mob));
        }
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut a = sim();
        let mut b = sim();
        assert_eq!(a.state_hash(), b.state_hash());

        a.add_player("user");
        b.add_player("user");
        place(&mut a, UnitKind::WallTower, 0, 1, 1, 0);
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
