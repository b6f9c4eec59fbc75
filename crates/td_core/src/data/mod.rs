//! Data structures for match configuration.
//!
//! Pure data, deserialized from RON. Every struct has a `Default`
//! carrying the standard balance numbers, and `#[serde(default)]` lets a
//! config file override only the fields it names.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by the adapter crates.

mod config;
mod enemy_data;
mod structure_data;
mod wave_data;

pub use config::{DroneConfig, EconomyConfig, ExtractionConfig, FogConfig, GameConfig, HeroConfig};
pub use enemy_data::{EnemyRoster, EnemyStats};
pub use structure_data::{BuildingStats, DroneComplement, StructureCatalog, TurretStats};
pub use wave_data::{WaveConfig, WavePlan};
