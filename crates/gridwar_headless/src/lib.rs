//! Headless scenario runner for CI and tuning checks.
//!
//! Loads a RON [`Scenario`], builds the simulation, ticks it to the end and
//! reports a JSON-serializable [`RunSummary`]. Nothing here draws; the
//! binary logs to stderr and writes results to stdout or a file.
//!
//! # Example
//!
//! ```bash
//! # Run the built-in siege scenario
//! cargo run -p gridwar_headless -- run
//!
//! # Run a scenario file and save the summary
//! cargo run -p gridwar_headless -- run --scenario scenarios/siege.ron --output results/siege.json
//!
//! # Verify determinism
//! cargo run -p gridwar_headless -- verify --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod runner;
pub mod scenario;

pub use runner::{verify_determinism, HeadlessRunner, PlayerSummary, RunSummary};
pub use scenario::{PlayerSetup, Scenario, ScenarioError, SpawnSetup, UnitPlacement};
