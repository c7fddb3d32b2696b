//! # Gridwar Core
//!
//! Deterministic simulation core for a grid tower-defense game.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded `ChaCha8Rng`)
//! - No floating-point math (uses fixed-point)
//!
//! The host drives it by calling [`Simulation::tick`](simulation::Simulation::tick)
//! with the elapsed time, feeding [`input::InputEvent`]s, and reading units,
//! edges and shots back for drawing.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Cells, occupancy, pixel/grid conversion
//! - [`terrain`] - Terrain catalog and generators
//! - [`unit`] - The unit record and its behavior tag
//! - [`catalog`] - Per-kind unit stats
//! - [`behavior`] - Per-tick unit logic
//! - [`targeting`] - Cached nearest-enemy search
//! - [`edges`] - Link network between a player's units
//! - [`economy`] - Resource and point redistribution
//! - [`shot`] - Projectiles
//! - [`timers`] - Scheduled actions such as enemy spawns
//! - [`input`] - Pointer/key input and ghost placement
//! - [`simulation`] - Core simulation loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behavior;
pub mod catalog;
pub mod config;
pub mod economy;
pub mod edges;
pub mod error;
pub mod grid;
pub mod input;
pub mod math;
pub mod player;
pub mod shot;
pub mod simulation;
pub mod targeting;
pub mod terrain;
pub mod timers;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{BehaviorTemplate, ShotKind, UnitCatalog, UnitStats};
    pub use crate::config::SimConfig;
    pub use crate::edges::{Edge, LinkNetwork};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Cell, Grid, GridCoord};
    pub use crate::input::{InputEvent, InputOutcome, Key};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::player::{Player, PlayerId, Selection};
    pub use crate::shot::{Shot, ShotId};
    pub use crate::simulation::{
        DamageEvent, Impact, MiningEvent, MoveEvent, Simulation, SpawnEvent, TickEvents,
        UnitSpawnParams, UnitStorage,
    };
    pub use crate::terrain::{Deposits, Terrain, TerrainGenerator, TerrainKind};
    pub use crate::timers::{TimerAction, TimerId};
    pub use crate::unit::{Behavior, Facing, Health, Owner, Unit, UnitId, UnitKind};
}
