//! Simulation tuning constants.
//!
//! Every number the tick loop depends on lives in [`SimConfig`]. The
//! defaults reproduce the classic 16x12 board; a RON document can override
//! any subset of fields.

use serde::{Deserialize, Serialize};

use crate::catalog::UnitCatalog;
use crate::error::{GameError, Result};
use crate::grid::GridCoord;
use crate::math::{fixed_int_serde, Fixed};
use crate::terrain::TerrainGenerator;
use crate::unit::UnitKind;

/// Largest board side, in pixels, that pixel-space math accepts.
pub const MAX_BOARD_PIXELS: i32 = 1 << 20;

/// Largest catalog link radius or base speed.
pub const MAX_UNIT_STAT: u32 = 1 << 20;

/// Tuning constants for one simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width in cells.
    pub grid_width: u32,
    /// Grid height in cells.
    pub grid_height: u32,
    /// Cell side length in pixels.
    #[serde(with = "fixed_int_serde")]
    pub cell_size: Fixed,
    /// Terrain assignment strategy.
    pub terrain: TerrainGenerator,
    /// Number of lookups a targeting cache entry survives.
    pub cache_ttl: u32,
    /// Maximum BFS expansion rounds per targeting search.
    pub bfs_rounds: u32,
    /// Cooldown between shots.
    pub shot_interval: u32,
    /// Cooldown between drill extractions.
    pub mine_interval: u32,
    /// Time per regenerated health point.
    pub regen_interval: u32,
    /// Resources consumed per shot (mobs are exempt).
    pub ammo_cost: u32,
    /// Amount a drill extracts per deposit flag.
    pub drill_yield: u32,
    /// Pixel distance under which a shot hits.
    #[serde(with = "fixed_int_serde")]
    pub collision_threshold: Fixed,
    /// Projectile speed in pixels per 1000 time units.
    #[serde(with = "fixed_int_serde")]
    pub shot_speed: Fixed,
    /// Manhattan distance at which a mobile unit stops to fire.
    pub mob_reach: u32,
    /// Cadence of the enemy spawn timer.
    pub spawn_interval: u32,
    /// Cells every player sees without any units.
    pub initial_visible: Vec<GridCoord>,
    /// Seed for terrain and wander targets.
    pub seed: u64,
    /// Per-kind unit stats.
    pub catalog: UnitCatalog,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 16,
            grid_height: 12,
            cell_size: Fixed::from_num(60),
            terrain: TerrainGenerator::default(),
            cache_ttl: 200,
            bfs_rounds: 10,
            shot_interval: 1000,
            mine_interval: 1000,
            regen_interval: 4000,
            ammo_cost: 1,
            drill_yield: 2,
            collision_threshold: Fixed::from_num(8),
            shot_speed: Fixed::from_num(600),
            mob_reach: 2,
            spawn_interval: 5000,
            initial_visible: vec![
                GridCoord::new(0, 0),
                GridCoord::new(0, 1),
                GridCoord::new(1, 0),
            ],
            seed: 0,
            catalog: UnitCatalog::default(),
        }
    }
}

impl SimConfig {
    /// Parse a config from RON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] on malformed input, or
    /// [`GameError::InvalidState`] if the parsed values cannot build a grid.
    pub fn from_ron_str(ron_text: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
            source_name: "simulation config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values the grid constructor asserts on, and the ranges
    /// pixel-space and cooldown math stay exact within.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(GameError::InvalidState(format!(
                "grid must be non-empty, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.cell_size <= Fixed::ZERO {
            return Err(GameError::InvalidState("cell_size must be positive".into()));
        }
        let side = self.grid_width.max(self.grid_height);
        let extent = i32::try_from(side)
            .ok()
            .and_then(|cells| self.cell_size.checked_mul(Fixed::from_num(cells)));
        if extent.map_or(true, |px| px > Fixed::from_num(MAX_BOARD_PIXELS)) {
            return Err(GameError::InvalidState(format!(
                "board spans more than {MAX_BOARD_PIXELS} pixels ({side} cells of {})",
                self.cell_size
            )));
        }
        if self.shot_speed <= Fixed::ZERO {
            return Err(GameError::InvalidState("shot_speed must be positive".into()));
        }
        if self.collision_threshold <= Fixed::ZERO {
            return Err(GameError::InvalidState(
                "collision_threshold must be positive".into(),
            ));
        }
        for kind in UnitKind::ALL {
            let stats = self.catalog.stats(kind);
            if stats.link_radius > MAX_UNIT_STAT {
                return Err(GameError::InvalidState(format!(
                    "{kind} link_radius {} exceeds {MAX_UNIT_STAT}",
                    stats.link_radius
                )));
            }
            if stats.base_speed > MAX_UNIT_STAT {
                return Err(GameError::InvalidState(format!(
                    "{kind} base_speed {} exceeds {MAX_UNIT_STAT}",
                    stats.base_speed
                )));
            }
        }
        Ok(())
    }
}
