//! # TD Core
//!
//! Deterministic simulation core for a grid tower-defense game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded RNG per tick)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless runs and batch balancing
//! - Replays and state hashing
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tile kinds and the level grid
//! - [`pathfinding`] - A* over route or assault tiles
//! - [`level`] - Level documents and layout validation
//! - [`components`] - Entity definitions
//! - [`simulation`] - Core simulation loop
//! - [`commands`] - Player command API
//! - [`session`] - Edit/play state machine and snapshot publishing
//! - [`data`] - Tunable balance data
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod combat;
pub mod commands;
pub mod components;
pub mod construction;
pub mod data;
pub mod drones;
pub mod economy;
pub mod effects;
pub mod enemies;
pub mod error;
pub mod feedback;
pub mod grid;
pub mod hero;
pub mod level;
pub mod math;
pub mod pathfinding;
pub mod session;
pub mod simulation;
pub mod snapshot;
pub mod store;
pub mod visibility;
pub mod waves;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{CommandOutcome, PlayerCommand};
    pub use crate::components::*;
    pub use crate::data::GameConfig;
    pub use crate::economy::{Cost, EconomyEvent, Resource, Resources};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Grid, GridListener, GridPos, TileChange, TileKind};
    pub use crate::level::LevelData;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::session::{GamePhase, GameSession};
    pub use crate::simulation::{MatchStatus, Simulation, TickEvents};
    pub use crate::snapshot::Snapshot;
}
