//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical config, seed and inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism this guards against:
//!
//! - **Floating-point math**: pixel space uses [`gridwar_core::math::Fixed`].
//! - **Map iteration order**: units, players and cache entries live in
//!   ordered maps and are walked in id order.
//! - **System randomness**: wandering, spawn cells and terrain all draw from
//!   the one `ChaCha8Rng` seeded by the config.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: per-module behavior inside `gridwar_core`
//! 2. **Property tests**: random inputs must still replay identically
//! 3. **Parallel tests**: N simulations on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use gridwar_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// All distinct hashes (one for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed message otherwise.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one tick
/// * `hash` - Computes the state hash
///
/// # Example
///
/// ```
/// use gridwar_test_utils::determinism::verify_determinism;
/// use gridwar_test_utils::fixtures::siege_sim;
///
/// let result = verify_determinism(
///     3,
///     50,
///     || siege_sim(7, 2, 2),
///     |sim| {
///         sim.tick(50);
///     },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a [`Simulation`] twice with the same setup and a fixed tick delta,
/// and compare the final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64, delta: u32) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick(delta);
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run N simulations on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
    delta: u32,
) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick(delta);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick.
///
/// Returns `None` if they never differ, `Some(tick)` for the first tick
/// whose state hash differs (0 for the initial state).
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, delta: u32) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick(delta);
        sim2.tick(delta);
        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use gridwar_core::grid::GridCoord;
    use gridwar_core::input::{InputEvent, Key};
    use gridwar_core::math::Vec2Fixed;
    use gridwar_core::unit::UnitKind;
    use proptest::prelude::*;

    /// A coordinate within a `width` x `height` board.
    pub fn arb_grid_coord(width: i32, height: i32) -> impl Strategy<Value = GridCoord> {
        (0..width, 0..height).prop_map(|(x, y)| GridCoord::new(x, y))
    }

    /// A coordinate that may fall anywhere around a 16x12 board, including
    /// well outside it.
    pub fn arb_any_coord() -> impl Strategy<Value = GridCoord> {
        (-40i32..40, -40i32..40).prop_map(|(x, y)| GridCoord::new(x, y))
    }

    /// A whole-pixel position around the default board.
    pub fn arb_pixel() -> impl Strategy<Value = Vec2Fixed> {
        (-200i32..1200, -200i32..900).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// A whole-pixel camera pan.
    pub fn arb_pan() -> impl Strategy<Value = Vec2Fixed> {
        (-300i32..300, -300i32..300).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// A tick delta.
    pub fn arb_delta() -> impl Strategy<Value = u32> {
        1u32..400
    }

    /// Per-unit resource shares for a roster of 1 to `max_len` units.
    pub fn arb_shares(max_len: usize) -> impl Strategy<Value = Vec<u32>> {
        proptest::collection::vec(0u32..1000, 1..max_len)
    }

    /// Any catalog kind.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        proptest::sample::select(UnitKind::ALL.to_vec())
    }

    /// A kind the player can build (everything but mobs).
    pub fn arb_buildable_kind() -> impl Strategy<Value = UnitKind> {
        arb_unit_kind().prop_filter("mobs are not buildable", |k| !k.is_mob())
    }

    /// One pointer or key event.
    pub fn arb_input_event() -> impl Strategy<Value = InputEvent> {
        prop_oneof![
            3 => arb_pixel().prop_map(InputEvent::PointerMove),
            1 => arb_pixel().prop_map(InputEvent::PointerDown),
            1 => arb_pixel().prop_map(InputEvent::PointerUp),
            1 => Just(InputEvent::KeyUp(Key::Cancel)),
        ]
    }

    /// A sequence of input events.
    pub fn arb_input_sequence(max_len: usize) -> impl Strategy<Value = Vec<InputEvent>> {
        proptest::collection::vec(arb_input_event(), 0..max_len)
    }
}
