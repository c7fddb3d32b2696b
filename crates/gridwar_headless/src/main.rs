//! Headless gridwar runner.
//!
//! Runs a scenario without graphics and prints a JSON summary.
//!
//! # Usage
//!
//! ```bash
//! # Built-in siege scenario
//! cargo run -p gridwar_headless -- run
//!
//! # Scenario file, overriding length and seed
//! cargo run -p gridwar_headless -- run --scenario siege.ron --ticks 6000 --seed 7
//!
//! # Same scenario five times, compare final hashes
//! cargo run -p gridwar_headless -- verify --scenario siege.ron --runs 5
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default filter.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gridwar_headless::{runner, HeadlessRunner, Scenario};

#[derive(Parser)]
#[command(name = "gridwar_headless")]
#[command(about = "Headless gridwar scenario runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print its summary
    Run {
        /// Scenario file to load (built-in siege when absent)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the number of ticks
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Write the summary here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same scenario several times
    Verify {
        /// Scenario file to load (built-in siege when absent)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            ticks,
            seed,
            output,
        }) => cmd_run(scenario, ticks, seed, output),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario, runs),
        None => cmd_run(None, None, None, None),
    }
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    let Some(path) = path else {
        return Scenario::siege();
    };
    match Scenario::load(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_run(path: Option<PathBuf>, ticks: Option<u64>, seed: Option<u64>, output: Option<PathBuf>) {
    let mut scenario = load_scenario(path);
    if let Some(ticks) = ticks {
        scenario.ticks = ticks;
    }
    if let Some(seed) = seed {
        scenario.config.seed = seed;
    }

    let runner = match HeadlessRunner::new(scenario) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    };
    let summary = runner.run();

    match output {
        Some(path) => {
            if let Err(e) = summary.save(&path) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            eprintln!("Summary written to {}", path.display());
        }
        None => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize summary: {e}");
                std::process::exit(1);
            }
        },
    }
}

fn cmd_verify(path: Option<PathBuf>, runs: u32) {
    let scenario = load_scenario(path);
    tracing::info!(scenario = %scenario.name, runs, "verifying determinism");

    match runner::verify_determinism(&scenario, runs) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    }
}
