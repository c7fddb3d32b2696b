//! Headless scenario runner.
//!
//! Drives a [`Simulation`] built from a [`Scenario`] for a fixed number of
//! ticks and folds every tick's events into a [`RunSummary`].

use std::collections::BTreeMap;
use std::path::Path;
use std::result::Result;

use gridwar_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::scenario::{Scenario, ScenarioError};

/// Final state of one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Units still alive, by kind name.
    pub units: BTreeMap<String, u32>,
    /// Resource pool at the end of the run.
    pub resources: u32,
    /// Point pool at the end of the run.
    pub points: u32,
    /// Units this player lost during the run.
    pub units_lost: u32,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed from the scenario config.
    pub seed: u64,
    /// Ticks executed.
    pub ticks: u64,
    /// Simulated time.
    pub elapsed: u64,
    /// Shots launched by units.
    pub shots_fired: u32,
    /// Shots that reached their aim point.
    pub impacts: u32,
    /// Total health removed.
    pub damage_dealt: u64,
    /// Units destroyed.
    pub deaths: u32,
    /// Mobs created by spawn timers.
    pub spawned: u32,
    /// Resources extracted by drills.
    pub mined_resources: u64,
    /// Points extracted by drills.
    pub mined_points: u64,
    /// Per-player end state, in id order.
    pub players: Vec<PlayerSummary>,
    /// Final simulation state hash.
    pub final_state_hash: u64,
}

impl RunSummary {
    /// Save the summary as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load a summary saved by [`RunSummary::save`].
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file is missing or not a summary.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Runs one scenario.
pub struct HeadlessRunner {
    scenario: Scenario,
    sim: Simulation,
    summary: RunSummary,
    owners: BTreeMap<UnitId, PlayerId>,
}

impl HeadlessRunner {
    /// Build the scenario's simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Setup`] if the scenario cannot be built.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        let sim = scenario.build()?;
        let summary = RunSummary {
            scenario: scenario.name.clone(),
            seed: scenario.config.seed,
            ..Default::default()
        };
        let mut runner = Self {
            scenario,
            sim,
            summary,
            owners: BTreeMap::new(),
        };
        runner.track_owners();
        Ok(runner)
    }

    /// The simulation being driven.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Advance one tick and record its events.
    pub fn step(&mut self) -> TickEvents {
        let events = self.sim.tick(self.scenario.delta);
        self.record(&events);
        self.track_owners();
        events
    }

    /// Run every tick the scenario asks for and return the summary.
    pub fn run(mut self) -> RunSummary {
        info!(
            scenario = %self.scenario.name,
            ticks = self.scenario.ticks,
            delta = self.scenario.delta,
            "run started"
        );
        for _ in 0..self.scenario.ticks {
            self.step();
        }
        let summary = self.finish();
        info!(
            scenario = %summary.scenario,
            deaths = summary.deaths,
            hash = summary.final_state_hash,
            "run finished"
        );
        summary
    }

    /// Close out the summary with the current end state.
    #[must_use]
    pub fn finish(mut self) -> RunSummary {
        self.summary.ticks = self.sim.get_tick();
        self.summary.elapsed = self.sim.elapsed();
        self.summary.final_state_hash = self.sim.state_hash();

        let lost = std::mem::take(&mut self.summary.players);
        self.summary.players = self
            .sim
            .players()
            .iter()
            .map(|player| {
                let mut units = BTreeMap::new();
                for unit in player.units.iter().filter_map(|&id| self.sim.unit(id)) {
                    *units.entry(unit.kind.name().to_string()).or_insert(0) += 1;
                }
                PlayerSummary {
                    id: player.id,
                    name: player.name.clone(),
                    units,
                    resources: self.sim.total_resources(player.id),
                    points: self.sim.total_points(player.id),
                    units_lost: lost
                        .iter()
                        .find(|p| p.id == player.id)
                        .map_or(0, |p| p.units_lost),
                }
            })
            .collect();
        self.summary
    }

    fn record(&mut self, events: &TickEvents) {
        let s = &mut self.summary;
        s.shots_fired += events.shots_fired.len() as u32;
        s.impacts += events.impacts.len() as u32;
        s.damage_dealt += events
            .damage_events
            .iter()
            .map(|d| u64::from(d.amount))
            .sum::<u64>();
        s.deaths += events.deaths.len() as u32;
        s.spawned += events.spawned.len() as u32;
        for spawn in &events.spawned {
            self.owners.insert(spawn.unit, spawn.owner);
        }
        for mined in &events.mined {
            s.mined_resources += u64::from(mined.resources);
            s.mined_points += u64::from(mined.points);
        }

        for dead in &events.deaths {
            let Some(&owner) = self.owners.get(dead) else {
                continue;
            };
            match s.players.iter_mut().find(|p| p.id == owner) {
                Some(p) => p.units_lost += 1,
                None => s.players.push(PlayerSummary {
                    id: owner,
                    units_lost: 1,
                    ..Default::default()
                }),
            }
        }

        if !events.deaths.is_empty() {
            debug!(tick = self.sim.get_tick(), deaths = events.deaths.len(), "units lost");
        }
    }

    fn track_owners(&mut self) {
        self.owners.clear();
        for player in self.sim.players() {
            for &id in &player.units {
                self.owners.insert(id, player.id);
            }
        }
    }
}

/// Run a scenario `runs` times and check every run ends on the same hash.
///
/// # Errors
///
/// Returns [`ScenarioError::Setup`] if the scenario cannot be built.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<bool, ScenarioError> {
    let mut hashes = Vec::new();
    for _ in 0..runs {
        let summary = HeadlessRunner::new(scenario.clone())?.run();
        hashes.push(summary.final_state_hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
