//! Simulation benchmarks for td_core.
//!
//! Run with: `cargo bench -p td_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use td_core::components::TurretVariant;
use td_core::grid::{Grid, GridPos, TileKind};
use td_core::pathfinding::{find_path, Traversal};
use td_test_utils::fixtures::{corridor_grid, lane_simulation, run_ticks, LANE_TURRET_SITE};

/// Serpentine 40x30 route: every other row is path, joined at alternating ends.
fn serpentine_grid() -> Grid {
    let mut grid = Grid::new(40, 30);
    for y in (0..30).step_by(2) {
        for x in 0..40 {
            grid.set(GridPos::new(x, y), TileKind::Path);
        }
        if y + 1 < 30 {
            let link = if (y / 2) % 2 == 0 { 39 } else { 0 };
            grid.set(GridPos::new(link, y + 1), TileKind::Path);
        }
    }
    grid.set(GridPos::new(0, 0), TileKind::Spawn);
    grid.set(GridPos::new(39, 28), TileKind::Base);
    grid
}

pub fn pathfinding_benchmark(c: &mut Criterion) {
    let corridor = corridor_grid(40);
    c.bench_function("find_path_corridor_40", |b| {
        b.iter(|| {
            find_path(
                black_box(&corridor),
                GridPos::new(0, 0),
                GridPos::new(39, 39),
                Traversal::Route,
            )
        });
    });

    let serpentine = serpentine_grid();
    c.bench_function("find_path_serpentine_40x30", |b| {
        b.iter(|| {
            find_path(
                black_box(&serpentine),
                GridPos::new(0, 0),
                GridPos::new(39, 28),
                Traversal::Route,
            )
        });
    });

    let open = Grid::new(40, 30);
    c.bench_function("find_path_open_assault", |b| {
        b.iter(|| {
            find_path(
                black_box(&open),
                GridPos::new(0, 0),
                GridPos::new(39, 29),
                Traversal::Assault,
            )
        });
    });
}

pub fn tick_benchmark(c: &mut Criterion) {
    // Mid-wave state with a turret on the lane.
    let mut warm = lane_simulation(42);
    let _ = warm.build_turret(LANE_TURRET_SITE, TurretVariant::Standard);
    let _ = warm.skip_countdown();
    run_ticks(&mut warm, 600);

    c.bench_function("tick_mid_wave", |b| {
        b.iter_batched(
            || warm.clone(),
            |mut sim| black_box(sim.tick()),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("tick_60_from_start", |b| {
        b.iter_batched(
            || lane_simulation(42),
            |mut sim| {
                run_ticks(&mut sim, 60);
                black_box(sim.tick_count())
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("state_hash", |b| b.iter(|| black_box(&warm).state_hash()));
}

criterion_group!(benches, pathfinding_benchmark, tick_benchmark);
criterion_main!(benches);
