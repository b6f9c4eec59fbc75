//! Wave composition tuning.

use serde::{Deserialize, Serialize};

use crate::components::EnemyKind;

/// Composition of a single wave.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WavePlan {
    /// Number of enemies to spawn.
    pub count: u32,
    /// Time between spawns.
    pub interval_ms: u32,
    /// Pool sampled uniformly for each spawn.
    pub types: Vec<EnemyKind>,
    /// Health multiplier in percent (100 = unscaled).
    #[serde(default = "default_health_pct")]
    pub health_pct: u32,
}

const fn default_health_pct() -> u32 {
    100
}

/// Rules for computing wave plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Countdown before each wave.
    pub preparation_ms: u32,
    /// Enemies in wave 1.
    pub base_count: u32,
    /// Extra enemies per wave after the first.
    pub count_growth: u32,
    /// Spawn interval in wave 1.
    pub base_interval_ms: u32,
    /// Interval reduction per wave after the first.
    pub interval_step_ms: u32,
    /// Interval floor.
    pub min_interval_ms: u32,
    /// First wave that includes scouts.
    pub scout_wave: u32,
    /// First wave that includes tanks.
    pub tank_wave: u32,
    /// Extra enemy health per wave after the first, in percent.
    pub health_growth_pct: u32,
    /// Explicit plans for the first waves; computed plans follow.
    pub scripted: Vec<WavePlan>,
}

impl WaveConfig {
    /// Plan for a 1-based wave number.
    #[must_use]
    pub fn plan(&self, wave: u32) -> WavePlan {
        let index = wave.saturating_sub(1);
        if let Some(plan) = self.scripted.get(index as usize) {
            return plan.clone();
        }

        let mut types = vec![EnemyKind::Standard];
        if wave >= self.scout_wave {
            types.push(EnemyKind::Scout);
        }
        if wave >= self.tank_wave {
            types.push(EnemyKind::Tank);
        }

        WavePlan {
            count: self.base_count + self.count_growth.saturating_mul(index),
            interval_ms: self
                .base_interval_ms
                .saturating_sub(self.interval_step_ms.saturating_mul(index))
                .max(self.min_interval_ms),
            types,
            health_pct: 100 + self.health_growth_pct.saturating_mul(index),
        }
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            preparation_ms: 10_000,
            base_count: 5,
            count_growth: 2,
            base_interval_ms: 1500,
            interval_step_ms: 100,
            min_interval_ms: 500,
            scout_wave: 3,
            tank_wave: 5,
            health_growth_pct: 10,
            scripted: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_one_plan() {
        let plan = WaveConfig::default().plan(1);
        assert_eq!(plan.count, 5);
        assert_eq!(plan.interval_ms, 1500);
        assert_eq!(plan.types, vec![EnemyKind::Standard]);
        assert_eq!(plan.health_pct, 100);
    }

    #[test]
    fn test_pool_unlocks_at_thresholds() {
        let config = WaveConfig::default();
        assert_eq!(config.plan(2).types.len(), 1);
        assert_eq!(config.plan(3).types, vec![EnemyKind::Standard, EnemyKind::Scout]);
        assert_eq!(config.plan(5).types.len(), 3);
    }

    #[test]
    fn test_interval_shrinks_to_floor() {
        let config = WaveConfig::default();
        assert_eq!(config.plan(2).interval_ms, 1400);
        assert_eq!(config.plan(11).interval_ms, 500);
        assert_eq!(config.plan(40).interval_ms, 500);
    }

    #[test]
    fn test_count_and_health_grow() {
        let config = WaveConfig::default();
        assert_eq!(config.plan(4).count, 11);
        assert_eq!(config.plan(4).health_pct, 130);
    }

    #[test]
    fn test_scripted_plan_overrides() {
        let config = WaveConfig {
            scripted: vec![WavePlan {
                count: 2,
                interval_ms: 300,
                types: vec![EnemyKind::Tank],
                health_pct: 100,
            }],
            ..WaveConfig::default()
        };
        assert_eq!(config.plan(1).types, vec![EnemyKind::Tank]);
        assert_eq!(config.plan(2).count, 7);
    }
}
