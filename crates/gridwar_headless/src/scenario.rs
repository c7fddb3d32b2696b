//! Scenario loading and setup.
//!
//! A scenario is a RON file describing the simulation config, the players,
//! their starting units and any enemy spawn timers. [`Scenario::build`]
//! turns it into a ready-to-tick [`Simulation`].

use std::path::Path;
use std::result::Result;

use gridwar_core::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The simulation rejected part of the setup.
    #[error("Invalid scenario setup: {0}")]
    Setup(#[from] GameError),
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Ticks to run.
    pub ticks: u64,
    /// Time units per tick.
    pub delta: u32,
    /// Simulation tuning and catalog.
    pub config: SimConfig,
    /// Players in id order.
    pub players: Vec<PlayerSetup>,
}

/// One player's starting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Display name.
    pub name: String,
    /// Units placed before the first tick, free of charge.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
    /// Repeating mob spawns for this player.
    #[serde(default)]
    pub spawns: Option<SpawnSetup>,
}

/// A starting unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Catalog kind.
    pub kind: UnitKind,
    /// Grid column.
    pub x: i32,
    /// Grid row.
    pub y: i32,
    /// Starting resource share.
    #[serde(default)]
    pub resources: u32,
    /// Starting point share.
    #[serde(default)]
    pub points: u32,
}

impl UnitPlacement {
    /// Placement with no starting shares.
    #[must_use]
    pub const fn new(kind: UnitKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            x,
            y,
            resources: 0,
            points: 0,
        }
    }

    /// Set the starting resource share.
    #[must_use]
    pub const fn with_resources(mut self, resources: u32) -> Self {
        self.resources = resources;
        self
    }
}

/// Enemy spawn timer setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpawnSetup {
    /// Fixed spawn cell; random cells when absent.
    #[serde(default)]
    pub at: Option<(i32, i32)>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::siege()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::ParseError`] for malformed RON.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A base with a control tower, a drill and two guns on the left,
    /// and a mob player spawning on the right edge.
    #[must_use]
    pub fn siege() -> Self {
        Self {
            name: "Siege".to_string(),
            description: "Hold the base against a steady stream of mobs".to_string(),
            ticks: 2400,
            delta: 50,
            config: SimConfig {
                terrain: TerrainGenerator::Banded,
                ..SimConfig::default()
            },
            players: vec![
                PlayerSetup {
                    name: "user".to_string(),
                    units: vec![
                        UnitPlacement::new(UnitKind::ControlTower, 1, 5).with_resources(500),
                        UnitPlacement::new(UnitKind::DrillTower, 0, 0),
                        UnitPlacement::new(UnitKind::GunTower, 3, 4),
                        UnitPlacement::new(UnitKind::GunTower, 3, 7),
                        UnitPlacement::new(UnitKind::BasicUnit, 2, 6),
                    ],
                    spawns: None,
                },
                PlayerSetup {
                    name: "mobs".to_string(),
                    units: vec![
                        UnitPlacement::new(UnitKind::Mob, 14, 3),
                        UnitPlacement::new(UnitKind::Mob, 14, 8),
                    ],
                    spawns: Some(SpawnSetup { at: Some((15, 6)) }),
                },
            ],
        }
    }

    /// Build the simulation: players in order, then their units, then
    /// spawn timers.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Setup`] if the config is invalid or a
    /// placement is off the grid.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        let mut sim = Simulation::new(self.config.clone())?;

        let ids: Vec<PlayerId> = self
            .players
            .iter()
            .map(|setup| sim.add_player(&setup.name))
            .collect();

        for (setup, &player) in self.players.iter().zip(&ids) {
            for placement in &setup.units {
                sim.create_unit(UnitSpawnParams {
                    kind: placement.kind,
                    owner: Owner::Player(player),
                    position: GridCoord::new(placement.x, placement.y),
                    force: true,
                    resources: placement.resources,
                    points: placement.points,
                })?;
            }
        }

        for (setup, &player) in self.players.iter().zip(&ids) {
            if let Some(spawns) = setup.spawns {
                let at = spawns.at.map(|(x, y)| GridCoord::new(x, y));
                sim.schedule_enemy_spawns(player, at);
            }
        }

        info!(
            scenario = %self.name,
            players = ids.len(),
            units = sim.units().len(),
            "scenario built"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_builds() {
        let scenario = Scenario::default();
        let sim = scenario.build().unwrap();
        assert_eq!(sim.players().len(), 2);
        assert_eq!(sim.player(0).unwrap().units.len(), 5);
        assert_eq!(sim.total_resources(0), 500);
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"(
            name: "Tiny",
            ticks: 10,
            config: (grid_width: 8, grid_height: 6, seed: 3),
            players: [
                (name: "user", units: [(kind: ControlTower, x: 1, y: 1, resources: 300)]),
                (name: "mobs", spawns: Some((at: None))),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Tiny");
        assert_eq!(scenario.delta, 50);
        assert_eq!(scenario.config.grid_width, 8);
        assert_eq!(scenario.players[1].spawns, Some(SpawnSetup { at: None }));

        let sim = scenario.build().unwrap();
        assert_eq!(sim.grid().width(), 8);
        assert_eq!(sim.total_resources(0), 300);
    }

    #[test]
    fn test_off_grid_placement_is_a_setup_error() {
        let mut scenario = Scenario::siege();
        scenario.players[0]
            .units
            .push(UnitPlacement::new(UnitKind::WallTower, 40, 40));
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::Setup(GameError::InvalidCoordinate(_)))
        ));
    }

    #[test]
    fn test_malformed_ron() {
        assert!(matches!(
            Scenario::from_ron_str("(name: 5"),
            Err(ScenarioError::ParseError(_))
        ));
    }
}
