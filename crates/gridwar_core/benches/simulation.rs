//! Simulation benchmarks for gridwar_core.
//!
//! Run with: `cargo bench -p gridwar_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use gridwar_core::prelude::*;
use gridwar_test_utils::fixtures::{place, siege_sim, two_player_sim};

/// Ticks a besieged base at a few population sizes.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for (towers, mobs) in [(2u32, 4u32), (8, 16), (24, 48)] {
        group.bench_with_input(
            BenchmarkId::new("siege_100_ticks", towers + mobs),
            &(towers, mobs),
            |b, &(towers, mobs)| {
                b.iter_batched(
                    || siege_sim(17, towers, mobs),
                    |mut sim| {
                        for _ in 0..100 {
                            black_box(sim.tick(50));
                        }
                        sim
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

/// Cold nearest-enemy searches across an empty board.
pub fn targeting_benchmark(c: &mut Criterion) {
    let (mut sim, user, mobs) = two_player_sim();
    place(&mut sim, UnitKind::WallTower, user, 0, 0, 0);
    place(&mut sim, UnitKind::Mob, mobs, 9, 9, 0);

    c.bench_function("targeting_cold_sweep", |b| {
        b.iter(|| {
            sim.targeting_mut().clear();
            black_box(sim.tick(50));
        });
    });
}

criterion_group!(benches, tick_benchmark, targeting_benchmark);
criterion_main!(benches);
