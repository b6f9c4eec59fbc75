//! Wave director: spawn scheduling and wave-to-wave scaling.
//!
//! ```text
//! Preparation --countdown/skip--> Spawning --quota met + field clear--> Cleared
//!      ^                                                                   |
//!      +----------------------------- next wave ---------------------------+
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::EnemyKind;
use crate::data::{WaveConfig, WavePlan};

/// Director phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavePhase {
    /// Counting down to the next wave.
    Preparation {
        /// Time left before spawning starts.
        remaining_ms: u32,
    },
    /// Emitting enemies on the spawn interval.
    Spawning,
    /// Quota spawned and no enemies left; advances next tick.
    Cleared,
}

/// An enemy the director wants spawned this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOrder {
    /// Archetype sampled from the wave pool.
    pub kind: EnemyKind,
    /// Health multiplier in percent.
    pub health_pct: u32,
}

/// Wave lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveEvent {
    /// Countdown ended; spawning begins.
    Started {
        /// Wave number.
        wave: u32,
        /// Enemies in the wave.
        count: u32,
    },
    /// Quota spawned and every enemy gone.
    Cleared {
        /// Wave number.
        wave: u32,
    },
    /// Preparation for the next wave began.
    Preparing {
        /// Upcoming wave number.
        wave: u32,
        /// Countdown length.
        countdown_ms: u32,
    },
}

/// Spawn scheduler state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveDirector {
    wave: u32,
    phase: WavePhase,
    plan: WavePlan,
    spawned: u32,
    spawn_timer_ms: u32,
}

impl WaveDirector {
    /// Director preparing wave 1.
    #[must_use]
    pub fn new(config: &WaveConfig) -> Self {
        Self {
            wave: 1,
            phase: WavePhase::Preparation {
                remaining_ms: config.preparation_ms,
            },
            plan: config.plan(1),
            spawned: 0,
            spawn_timer_ms: 0,
        }
    }

    /// Current 1-based wave number.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Plan of the current wave.
    #[must_use]
    pub const fn plan(&self) -> &WavePlan {
        &self.plan
    }

    /// Enemies already spawned this wave.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Enemies still queued for this wave.
    #[must_use]
    pub const fn remaining_to_spawn(&self) -> u32 {
        self.plan.count.saturating_sub(self.spawned)
    }

    /// Countdown remaining, if preparing.
    #[must_use]
    pub const fn countdown_ms(&self) -> Option<u32> {
        match self.phase {
            WavePhase::Preparation { remaining_ms } => Some(remaining_ms),
            WavePhase::Spawning | WavePhase::Cleared => None,
        }
    }

    /// Start the current wave on the next tick. Returns false unless a
    /// countdown is still running.
    pub fn skip_countdown(&mut self) -> bool {
        match &mut self.phase {
            WavePhase::Preparation { remaining_ms } if *remaining_ms > 0 => {
                *remaining_ms = 0;
                true
            }
            _ => false,
        }
    }

    /// Advance by `dt_ms`.
    ///
    /// `alive` is the number of enemies on the field before this call.
    /// Returns the enemies to spawn, in order.
    pub fn tick<R: Rng>(
        &mut self,
        dt_ms: u32,
        alive: usize,
        config: &WaveConfig,
        rng: &mut R,
        events: &mut Vec<WaveEvent>,
    ) -> Vec<SpawnOrder> {
        let mut orders = Vec::new();

        match self.phase {
            WavePhase::Preparation { remaining_ms } => {
                if remaining_ms <= dt_ms {
                    self.phase = WavePhase::Spawning;
                    self.spawn_timer_ms = 0;
                    tracing::info!(wave = self.wave, count = self.plan.count, "Wave started");
                    events.push(WaveEvent::Started {
                        wave: self.wave,
                        count: self.plan.count,
                    });
                } else {
                    self.phase = WavePhase::Preparation {
                        remaining_ms: remaining_ms - dt_ms,
                    };
                }
            }
            WavePhase::Spawning => {
                self.spawn_timer_ms = self.spawn_timer_ms.saturating_add(dt_ms);
                let interval = self.plan.interval_ms.max(1);
                while self.remaining_to_spawn() > 0 && self.spawn_timer_ms >= interval {
                    self.spawn_timer_ms -= interval;
                    self.spawned += 1;
                    orders.push(SpawnOrder {
                        kind: self.sample_kind(rng),
                        health_pct: self.plan.health_pct,
                    });
                }

                if self.remaining_to_spawn() == 0 && alive == 0 && orders.is_empty() {
                    self.phase = WavePhase::Cleared;
                    tracing::info!(wave = self.wave, "Wave cleared");
                    events.push(WaveEvent::Cleared { wave: self.wave });
                }
            }
            WavePhase::Cleared => {
                self.wave += 1;
                self.plan = config.plan(self.wave);
                self.spawned = 0;
                self.spawn_timer_ms = 0;
                self.phase = WavePhase::Preparation {
                    remaining_ms: config.preparation_ms,
                };
                events.push(WaveEvent::Preparing {
                    wave: self.wave,
                    countdown_ms: config.preparation_ms,
                });
            }
        }

        orders
    }

    fn sample_kind<R: Rng>(&self, rng: &mut R) -> EnemyKind {
        match self.plan.types.len() {
            0 => EnemyKind::Standard,
            1 => self.plan.types[0],
            n => self.plan.types[rng.random_range(0..n)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scripted_config() -> WaveConfig {
        WaveConfig {
            preparation_ms: 3000,
            scripted: vec![WavePlan {
                count: 5,
                interval_ms: 1500,
                types: vec![EnemyKind::Standard],
                health_pct: 100,
            }],
            ..WaveConfig::default()
        }
    }

    #[test]
    fn test_five_intervals_spawn_five_standard_enemies() {
        let config = scripted_config();
        let mut director = WaveDirector::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = Vec::new();

        assert!(director.skip_countdown());
        assert!(director.tick(16, 0, &config, &mut rng, &mut events).is_empty());
        assert_eq!(director.phase(), WavePhase::Spawning);

        let mut spawned = Vec::new();
        for i in 0..5 {
            spawned.extend(director.tick(1500, i, &config, &mut rng, &mut events));
        }

        assert_eq!(spawned.len(), 5);
        assert!(spawned.iter().all(|o| o.kind == EnemyKind::Standard));
        assert_eq!(director.remaining_to_spawn(), 0);
    }

    #[test]
    fn test_countdown_elapses() {
        let config = scripted_config();
        let mut director = WaveDirector::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = Vec::new();

        director.tick(2000, 0, &config, &mut rng, &mut events);
        assert_eq!(director.countdown_ms(), Some(1000));
        director.tick(1000, 0, &config, &mut rng, &mut events);
        assert_eq!(director.phase(), WavePhase::Spawning);
        assert_eq!(events, vec![WaveEvent::Started { wave: 1, count: 5 }]);
    }

    #[test]
    fn test_wave_waits_for_field_to_clear() {
        let config = scripted_config();
        let mut director = WaveDirector::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = Vec::new();

        director.skip_countdown();
        director.tick(0, 0, &config, &mut rng, &mut events);
        let orders = director.tick(7500, 0, &config, &mut rng, &mut events);
        assert_eq!(orders.len(), 5);

        // Enemies alive: still spawning phase.
        director.tick(16, 3, &config, &mut rng, &mut events);
        assert_eq!(director.phase(), WavePhase::Spawning);

        director.tick(16, 0, &config, &mut rng, &mut events);
        assert_eq!(director.phase(), WavePhase::Cleared);

        director.tick(16, 0, &config, &mut rng, &mut events);
        assert_eq!(director.wave(), 2);
        assert_eq!(director.countdown_ms(), Some(3000));
        assert_eq!(director.plan().count, 7);
        assert!(events.contains(&WaveEvent::Cleared { wave: 1 }));
    }

    #[test]
    fn test_sampling_is_seeded() {
        let config = WaveConfig {
            preparation_ms: 0,
            scripted: vec![WavePlan {
                count: 20,
                interval_ms: 10,
                types: vec![EnemyKind::Standard, EnemyKind::Scout, EnemyKind::Tank],
                health_pct: 100,
            }],
            ..WaveConfig::default()
        };
        let run = |seed| {
            let mut director = WaveDirector::new(&config);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut events = Vec::new();
            director.tick(0, 0, &config, &mut rng, &mut events);
            director.tick(200, 0, &config, &mut rng, &mut events)
        };
        assert_eq!(run(42), run(42));
        assert_eq!(run(42).len(), 20);
    }

    #[test]
    fn test_skip_only_during_preparation() {
        let config = scripted_config();
        let mut director = WaveDirector::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        director.skip_countdown();
        director.tick(0, 0, &config, &mut rng, &mut Vec::new());
        assert!(!director.skip_countdown());
    }
}
