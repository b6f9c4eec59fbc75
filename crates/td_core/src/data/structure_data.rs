//! Turret and building statistics.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, TurretVariant};
use crate::economy::Cost;
use crate::math::{fixed_serde, Fixed};

/// Statistics for one turret variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurretStats {
    /// Health pool.
    pub max_health: u32,
    /// Range at level 1.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Damage at level 1.
    pub damage: u32,
    /// Minimum time between shots.
    pub cooldown_ms: u32,
    /// Percent chance of a critical hit.
    pub crit_chance_pct: u32,
    /// Damage multiplier on a critical hit.
    #[serde(with = "fixed_serde")]
    pub crit_multiplier: Fixed,
    /// Projectile speed in tiles per second.
    #[serde(with = "fixed_serde")]
    pub projectile_speed: Fixed,
    /// Queue cost.
    pub build_cost: Cost,
    /// Cost of each upgrade.
    pub upgrade_cost: Cost,
    /// Damage gained per level.
    pub damage_per_level: u32,
    /// Range gained per level.
    #[serde(with = "fixed_serde")]
    pub range_per_level: Fixed,
    /// Highest reachable level.
    pub max_level: u32,
    /// Fog reveal radius in tiles.
    pub reveal_radius: u32,
}

/// Drones housed by a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DroneComplement {
    /// Worker drones.
    pub workers: u32,
    /// Repair drones.
    pub repairers: u32,
    /// Harvester drones.
    pub harvesters: u32,
}

impl DroneComplement {
    /// Total drones.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.workers + self.repairers + self.harvesters
    }
}

/// Statistics for one building kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingStats {
    /// Health pool.
    pub max_health: u32,
    /// Resources per second while active.
    pub production_rate: u32,
    /// Queue cost.
    pub build_cost: Cost,
    /// Cost of restoring an abandoned instance.
    pub restore_cost: Cost,
    /// Drones spawned when the building comes online.
    #[serde(default)]
    pub drones: DroneComplement,
    /// Fog reveal radius in tiles.
    pub reveal_radius: u32,
}

/// Statistics for every structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureCatalog {
    /// Standard turret.
    pub turret: TurretStats,
    /// Sniper turret.
    pub sniper: TurretStats,
    /// Quarry.
    pub quarry: BuildingStats,
    /// Forge.
    pub forge: BuildingStats,
    /// Drone factory.
    pub drone_factory: BuildingStats,
    /// Maintenance hub.
    pub maintenance_hub: BuildingStats,
}

impl StructureCatalog {
    /// Stats for a turret variant.
    #[must_use]
    pub const fn turret(&self, variant: TurretVariant) -> &TurretStats {
        match variant {
            TurretVariant::Standard => &self.turret,
            TurretVariant::Sniper => &self.sniper,
        }
    }

    /// Stats for a building kind.
    #[must_use]
    pub const fn building(&self, kind: BuildingKind) -> &BuildingStats {
        match kind {
            BuildingKind::Quarry => &self.quarry,
            BuildingKind::Forge => &self.forge,
            BuildingKind::DroneFactory => &self.drone_factory,
            BuildingKind::MaintenanceHub => &self.maintenance_hub,
        }
    }
}

impl Default for StructureCatalog {
    fn default() -> Self {
        Self {
            turret: TurretStats {
                max_health: 200,
                range: Fixed::from_num(3),
                damage: 20,
                cooldown_ms: 800,
                crit_chance_pct: 10,
                crit_multiplier: Fixed::from_num(1.5),
                projectile_speed: Fixed::from_num(12),
                build_cost: Cost::metal(50),
                upgrade_cost: Cost::metal(75),
                damage_per_level: 10,
                range_per_level: Fixed::from_num(0.5),
                max_level: 3,
                reveal_radius: 3,
            },
            sniper: TurretStats {
                max_health: 150,
                range: Fixed::from_num(7),
                damage: 60,
                cooldown_ms: 2500,
                crit_chance_pct: 35,
                crit_multiplier: Fixed::from_num(2.5),
                projectile_speed: Fixed::from_num(24),
                build_cost: Cost::metal(120),
                upgrade_cost: Cost::metal(150),
                damage_per_level: 30,
                range_per_level: Fixed::ONE,
                max_level: 3,
                reveal_radius: 4,
            },
            quarry: BuildingStats {
                max_health: 300,
                production_rate: 2,
                build_cost: Cost::stone(50),
                restore_cost: Cost::new(25, 10),
                drones: DroneComplement::default(),
                reveal_radius: 4,
            },
            forge: BuildingStats {
                max_health: 300,
                production_rate: 1,
                build_cost: Cost::stone(100),
                restore_cost: Cost::new(25, 10),
                drones: DroneComplement::default(),
                reveal_radius: 4,
            },
            drone_factory: BuildingStats {
                max_health: 400,
                production_rate: 0,
                build_cost: Cost::new(100, 50),
                restore_cost: Cost::new(50, 50),
                drones: DroneComplement {
                    workers: 2,
                    repairers: 0,
                    harvesters: 1,
                },
                reveal_radius: 5,
            },
            maintenance_hub: BuildingStats {
                max_health: 400,
                production_rate: 0,
                build_cost: Cost::new(100, 100),
                restore_cost: Cost::new(50, 50),
                drones: DroneComplement {
                    workers: 0,
                    repairers: 2,
                    harvesters: 0,
                },
                reveal_radius: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniper_outranges_standard() {
        let catalog = StructureCatalog::default();
        let standard = catalog.turret(TurretVariant::Standard);
        let sniper = catalog.turret(TurretVariant::Sniper);
        assert!(sniper.range > standard.range);
        assert!(sniper.cooldown_ms > standard.cooldown_ms);
        assert!(sniper.crit_chance_pct > standard.crit_chance_pct);
    }

    #[test]
    fn test_building_lookup() {
        let catalog = StructureCatalog::default();
        assert_eq!(catalog.building(BuildingKind::Quarry).build_cost, Cost::stone(50));
        assert_eq!(catalog.building(BuildingKind::MaintenanceHub).drones.repairers, 2);
        assert_eq!(catalog.building(BuildingKind::DroneFactory).drones.total(), 3);
    }
}
