//! Enemy archetype statistics.

use serde::{Deserialize, Serialize};

use crate::components::EnemyKind;
use crate::math::{fixed_serde, Fixed};

/// Base statistics for one enemy archetype before wave scaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Health at wave 1.
    pub health: u32,
    /// Tiles per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Metal paid on death.
    pub reward: u32,
    /// Lives lost when it reaches the base.
    #[serde(default = "default_life_cost")]
    pub life_cost: u32,
    /// Damage per attack.
    pub damage: u32,
    /// Attack reach in tiles.
    #[serde(with = "fixed_serde")]
    pub attack_range: Fixed,
    /// Minimum time between attacks.
    pub attack_cooldown_ms: u32,
    /// Fires projectiles instead of striking in melee.
    #[serde(default)]
    pub ranged: bool,
    /// Radius within which it leaves the route to hunt. Zero never hunts.
    #[serde(with = "fixed_serde")]
    pub aggro_radius: Fixed,
    /// Projectile speed for ranged attackers.
    #[serde(with = "fixed_serde")]
    pub projectile_speed: Fixed,
}

const fn default_life_cost() -> u32 {
    1
}

/// Statistics for every enemy archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyRoster {
    /// Baseline walker.
    pub standard: EnemyStats,
    /// Fast, fragile runner.
    pub scout: EnemyStats,
    /// Slow ranged heavy.
    pub tank: EnemyStats,
}

impl EnemyRoster {
    /// Stats for one archetype.
    #[must_use]
    pub const fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Standard => &self.standard,
            EnemyKind::Scout => &self.scout,
            EnemyKind::Tank => &self.tank,
        }
    }
}

impl Default for EnemyRoster {
    fn default() -> Self {
        Self {
            standard: EnemyStats {
                health: 100,
                speed: Fixed::from_num(2.5),
                reward: 10,
                life_cost: 1,
                damage: 8,
                attack_range: Fixed::from_num(0.8),
                attack_cooldown_ms: 1000,
                ranged: false,
                aggro_radius: Fixed::from_num(2.5),
                projectile_speed: Fixed::ZERO,
            },
            scout: EnemyStats {
                health: 40,
                speed: Fixed::from_num(4.5),
                reward: 5,
                life_cost: 1,
                damage: 4,
                attack_range: Fixed::from_num(0.8),
                attack_cooldown_ms: 700,
                ranged: false,
                aggro_radius: Fixed::ZERO,
                projectile_speed: Fixed::ZERO,
            },
            tank: EnemyStats {
                health: 300,
                speed: Fixed::from_num(1.2),
                reward: 25,
                life_cost: 2,
                damage: 20,
                attack_range: Fixed::from_num(4),
                attack_cooldown_ms: 2000,
                ranged: true,
                aggro_radius: Fixed::from_num(4),
                projectile_speed: Fixed::from_num(8),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_matches_archetypes() {
        let roster = EnemyRoster::default();
        assert_eq!(roster.get(EnemyKind::Standard).health, 100);
        assert_eq!(roster.get(EnemyKind::Scout).reward, 5);
        assert!(roster.get(EnemyKind::Tank).ranged);
        assert!(roster.get(EnemyKind::Scout).speed > roster.get(EnemyKind::Standard).speed);
        assert_eq!(roster.get(EnemyKind::Scout).aggro_radius, Fixed::ZERO);
    }
}
