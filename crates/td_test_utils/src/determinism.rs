//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces
//! identical results given identical inputs.
//!
//! # Sources of non-determinism
//!
//! - **Floating-point math**: positions, speeds and ranges use
//!   [`td_core::math::Fixed`].
//! - **Iteration order**: entity stores are ordered maps keyed by id.
//! - **Randomness**: spawn sampling, critical hits and particle scatter
//!   draw from an RNG seeded by the config seed and the tick number.
//!
//! A tick is therefore a pure function of (state, commands). The helpers
//! here check that claim from a few angles: repeated runs, tick-by-tick
//! comparison, parallel runs and save/load.

use std::thread;

use td_core::commands::PlayerCommand;
use td_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (1 for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs agreed, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one step
/// * `hash` - Computes the state hash
///
/// # Example
///
/// ```ignore
/// use td_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     5,
///     600,
///     || lane_simulation(7),
///     |sim| { sim.tick(); },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run two identical simulations and compare their final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        |sim| sim.state_hash(),
    );
    result.is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "Parallel simulations diverged after {} ticks across {} runs: {:?}",
            self.ticks,
            self.num_sims,
            self.hashes
        );
    }
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` for the first tick
/// whose hashes differ (0 means the initial states already differ).
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a save/load round-trip preserves state, and that the
/// restored copy keeps evolving identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        sim.tick();
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        sim.tick();
        restored.tick();
    }
    restored.state_hash() == sim.state_hash()
}

/// Play a command script and return the final state hash.
///
/// Each entry is applied just before the tick it names; rejected commands
/// are ignored, as a player would see a notice and carry on.
pub fn replay_script(mut sim: Simulation, script: &[(u64, PlayerCommand)], num_ticks: u64) -> u64 {
    for tick in 0..num_ticks {
        for (_, command) in script.iter().filter(|(at, _)| *at == tick) {
            let _ = sim.apply_command(command);
        }
        sim.tick();
    }
    sim.state_hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{lane_simulation, LANE_STONE, LANE_TURRET_SITE};
    use crate::strategies;
    use proptest::prelude::*;
    use td_core::components::{BuildingKind, TurretVariant};

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
        assert_eq!(result.unique_hashes(), vec![100]);
    }

    #[test]
    fn test_verify_determinism_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_lane_simulation_is_deterministic() {
        assert!(verify_simulation_determinism(|| lane_simulation(11), 600));
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| lane_simulation(3), 300), None);
    }

    #[test]
    fn test_seed_is_part_of_state() {
        assert_ne!(lane_simulation(1).state_hash(), lane_simulation(2).state_hash());
    }

    #[test]
    fn test_serialization_round_trip_keeps_evolving() {
        assert!(verify_serialization_determinism(|| lane_simulation(5), 400));
    }

    #[test]
    fn test_parallel_runs_agree() {
        let result = run_parallel_simulations(|| lane_simulation(9), 4, 300);
        result.assert_deterministic();
        assert_eq!(result.num_sims, 4);
    }

    #[test]
    fn test_replay_script_is_reproducible() {
        let script = vec![
            (
                0,
                PlayerCommand::BuildTurret {
                    x: LANE_TURRET_SITE.x,
                    y: LANE_TURRET_SITE.y,
                    variant: TurretVariant::Standard,
                },
            ),
            (
                30,
                PlayerCommand::BuildBuilding {
                    x: LANE_STONE.x,
                    y: LANE_STONE.y,
                    kind: BuildingKind::Quarry,
                },
            ),
            (60, PlayerCommand::SkipCountdown),
        ];
        let first = replay_script(lane_simulation(4), &script, 900);
        let second = replay_script(lane_simulation(4), &script, 900);
        assert_eq!(first, second);
        assert_ne!(first, replay_script(lane_simulation(4), &[], 900));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Any command script replays to the same state.
        #[test]
        fn prop_command_scripts_are_replayable(
            script in strategies::arb_timed_script(12, 6, 300, 12),
        ) {
            let first = replay_script(lane_simulation(21), &script, 300);
            let second = replay_script(lane_simulation(21), &script, 300);
            prop_assert_eq!(first, second);
        }
    }
}
