//! Top-level match configuration.

use serde::{Deserialize, Serialize};

use super::{DroneComplement, EnemyRoster, StructureCatalog, WaveConfig};
use crate::components::TargetCategory;
use crate::economy::{Cost, Resources};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};

/// Hero statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    /// Spawn a hero at the base when the match starts.
    pub enabled: bool,
    /// Health pool.
    pub max_health: u32,
    /// Tiles per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage per shot.
    pub damage: u32,
    /// Firing range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Minimum time between shots.
    pub cooldown_ms: u32,
    /// Percent chance of a critical hit.
    pub crit_chance_pct: u32,
    /// Damage multiplier on a critical hit.
    #[serde(with = "fixed_serde")]
    pub crit_multiplier: Fixed,
    /// Projectile speed.
    #[serde(with = "fixed_serde")]
    pub projectile_speed: Fixed,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_health: 500,
            speed: Fixed::from_num(4),
            damage: 25,
            range: Fixed::from_num(4),
            cooldown_ms: 500,
            crit_chance_pct: 15,
            crit_multiplier: Fixed::from_num(2),
            projectile_speed: Fixed::from_num(15),
        }
    }
}

/// Drone behavior tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    /// Worker and repair drone speed.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Harvester speed.
    #[serde(with = "fixed_serde")]
    pub harvester_speed: Fixed,
    /// Arrival threshold.
    #[serde(with = "fixed_serde")]
    pub arrival_epsilon: Fixed,
    /// Construction progress per second (percent).
    pub build_rate: u32,
    /// Health restored per second by a repair drone.
    pub repair_rate: u32,
    /// Health points restored per unit of metal.
    pub repair_hp_per_metal: u32,
    /// Repair drones only answer calls within this many tiles of home.
    #[serde(with = "fixed_serde")]
    pub repair_radius: Fixed,
    /// Units a harvester carries per trip.
    pub harvest_capacity: u32,
    /// Time spent gathering one load.
    pub harvest_time_ms: u32,
    /// Drones the base provides at match start.
    pub base_complement: DroneComplement,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            speed: Fixed::from_num(3),
            harvester_speed: Fixed::from_num(2.5),
            arrival_epsilon: Fixed::from_num(0.1),
            build_rate: 20,
            repair_rate: 20,
            repair_hp_per_metal: 2,
            repair_radius: Fixed::from_num(8),
            harvest_capacity: 10,
            harvest_time_ms: 2000,
            base_complement: DroneComplement {
                workers: 1,
                repairers: 0,
                harvesters: 0,
            },
        }
    }
}

/// Vision radii.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    /// Disc around the hero.
    pub hero_radius: u32,
    /// Length of the forward vision cone (0 disables it).
    pub hero_cone_length: u32,
    /// Disc around the base.
    pub base_radius: u32,
    /// Disc around each extraction point.
    pub extraction_radius: u32,
    /// Disc around every path tile.
    pub path_radius: u32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            hero_radius: 5,
            hero_cone_length: 8,
            base_radius: 6,
            extraction_radius: 6,
            path_radius: 1,
        }
    }
}

/// Command pricing not tied to a specific structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Flat fee for clearing rubble or wreckage.
    pub clear_rubble_cost: Cost,
    /// Percentage of invested cost refunded on sell.
    pub sell_refund_pct: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            clear_rubble_cost: Cost::stone(15),
            sell_refund_pct: 50,
        }
    }
}

/// Win condition tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Time the hero must hold an extraction point.
    pub duration_ms: u64,
    /// Distance from the extraction tile that counts as holding it.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 60_000,
            radius: Fixed::from_num(1.5),
        }
    }
}

/// Everything tunable about a match.
///
/// # Example RON
///
/// ```ron
/// GameConfig(
///     seed: 7,
///     starting_resources: Resources(stone: 40, metal: 0),
///     target_priority: [hero, structure, base],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for spawn sampling, critical hits and effects.
    pub seed: u64,
    /// Ledger at match start.
    pub starting_resources: Resources,
    /// Lives at match start.
    pub starting_lives: u32,
    /// Enemy archetypes.
    pub enemies: EnemyRoster,
    /// Turret and building stats.
    pub structures: StructureCatalog,
    /// Hero stats.
    pub hero: HeroConfig,
    /// Wave tuning.
    pub waves: WaveConfig,
    /// Drone tuning.
    pub drones: DroneConfig,
    /// Vision radii.
    pub fog: FogConfig,
    /// Command pricing.
    pub economy: EconomyConfig,
    /// Win condition.
    pub extraction: ExtractionConfig,
    /// Ranked categories enemies consider when picking a target.
    pub target_priority: Vec<TargetCategory>,
    /// Ticks between enemy retargeting passes (staggered by id).
    pub retarget_interval_ticks: u64,
    /// Turrets prefer enemies that can shoot back.
    pub turrets_prefer_ranged: bool,
    /// Build commands require the site to be visible.
    pub require_visible_build_site: bool,
    /// Identical notices are suppressed for this long.
    pub notice_cooldown_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            starting_resources: Resources::new(100, 150),
            starting_lives: 20,
            enemies: EnemyRoster::default(),
            structures: StructureCatalog::default(),
            hero: HeroConfig::default(),
            waves: WaveConfig::default(),
            drones: DroneConfig::default(),
            fog: FogConfig::default(),
            economy: EconomyConfig::default(),
            extraction: ExtractionConfig::default(),
            target_priority: vec![
                TargetCategory::Structure,
                TargetCategory::Hero,
                TargetCategory::Base,
            ],
            retarget_interval_ticks: 15,
            turrets_prefer_ranged: true,
            require_visible_build_site: true,
            notice_cooldown_ms: 2000,
        }
    }
}

impl GameConfig {
    /// Parse a configuration from RON text. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] when the text is not valid RON
    /// for this structure.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<config>".into(),
            message: e.to_string(),
        })
    }

    /// Render as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize config: {e}")))
    }

    /// Builder: set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set starting resources.
    #[must_use]
    pub fn with_resources(mut self, stone: u32, metal: u32) -> Self {
        self.starting_resources = Resources::new(stone, metal);
        self
    }

    /// Builder: disable the hero.
    #[must_use]
    pub fn without_hero(mut self) -> Self {
        self.hero.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = GameConfig::from_ron_str(
            "(seed: 7, starting_resources: (stone: 40, metal: 0), target_priority: [hero, base])",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.starting_resources, Resources::new(40, 0));
        assert_eq!(
            config.target_priority,
            vec![TargetCategory::Hero, TargetCategory::Base]
        );
        assert_eq!(config.starting_lives, 20);
        assert_eq!(config.waves, WaveConfig::default());
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = GameConfig::default().with_seed(99).without_hero();
        let text = config.to_ron_string().unwrap();
        assert_eq!(GameConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_ron_is_parse_error() {
        let err = GameConfig::from_ron_str("(seed: \"seven\")").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { .. }));
    }
}
