//! Test fixtures and helpers.
//!
//! Pre-built grids and simulations for consistent testing.

use fixed::types::I32F32;
use td_core::data::GameConfig;
use td_core::grid::{Grid, GridPos, TileKind};
use td_core::simulation::Simulation;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Simulation code never uses floats; this is only for test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Spawn tile of [`lane_level`].
pub const LANE_SPAWN: GridPos = GridPos::new(0, 0);
/// Base tile of [`lane_level`].
pub const LANE_BASE: GridPos = GridPos::new(11, 0);
/// Stone deposit in [`lane_level`].
pub const LANE_STONE: GridPos = GridPos::new(6, 2);
/// Metal deposit in [`lane_level`].
pub const LANE_METAL: GridPos = GridPos::new(8, 3);
/// Rubble tile in [`lane_level`].
pub const LANE_RUBBLE: GridPos = GridPos::new(7, 2);
/// Extraction point in [`lane_level`].
pub const LANE_EXTRACTION: GridPos = GridPos::new(11, 5);
/// Empty tile next to the lane, visible from the base.
pub const LANE_TURRET_SITE: GridPos = GridPos::new(9, 1);

/// L-shaped corridor: path along row 0, then down the last column.
///
/// Spawn sits at (0, 0) and the base at the bottom-right corner.
#[must_use]
pub fn corridor_grid(size: u32) -> Grid {
    let mut grid = Grid::new(size, size);
    let last = size - 1;
    for x in 0..size {
        grid.set(GridPos::new(x, 0), TileKind::Path);
    }
    for y in 0..size {
        grid.set(GridPos::new(last, y), TileKind::Path);
    }
    grid.set(GridPos::new(0, 0), TileKind::Spawn);
    grid.set(GridPos::new(last, last), TileKind::Base);
    grid
}

/// A 12x6 level with one straight lane along row 0 and one of each
/// interesting tile nearby.
///
/// ```text
/// S . . . . . . . . . . B
/// _ _ _ _ _ _ _ _ _ t _ _
/// _ _ _ _ _ _ s r _ _ _ _
/// _ _ _ _ _ _ _ _ m _ _ _
/// _ _ _ _ _ _ _ _ _ _ _ _
/// _ _ _ _ _ _ _ _ _ _ _ X
/// ```
#[must_use]
pub fn lane_level() -> Grid {
    let mut grid = Grid::new(12, 6);
    for x in 0..12 {
        grid.set(GridPos::new(x, 0), TileKind::Path);
    }
    grid.set(LANE_SPAWN, TileKind::Spawn);
    grid.set(LANE_BASE, TileKind::Base);
    grid.set(LANE_STONE, TileKind::ResourceStone);
    grid.set(LANE_METAL, TileKind::ResourceMetal);
    grid.set(LANE_RUBBLE, TileKind::Rubble);
    grid.set(LANE_EXTRACTION, TileKind::ExtractionPoint);
    grid
}

/// Fresh simulation on [`lane_level`] with the given seed.
///
/// # Panics
///
/// Never for the built-in level; it is always playable.
#[must_use]
pub fn lane_simulation(seed: u64) -> Simulation {
    Simulation::new(lane_level(), GameConfig::default().with_seed(seed))
        .expect("lane level is playable")
}

/// Run `sim` for `ticks` ticks.
pub fn run_ticks(sim: &mut Simulation, ticks: u64) {
    for _ in 0..ticks {
        sim.tick();
    }
}
