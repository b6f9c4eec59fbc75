//! Batch match runner for balance testing.
//!
//! Plays many seeds of one level in parallel using rayon, each driven by
//! an [`Autopilot`], and collects per-match results plus an aggregate.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use td_core::data::GameConfig;
use td_core::grid::Grid;
use td_core::simulation::Simulation;

use crate::autopilot::Autopilot;
use crate::protocol::GameResult;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Level label for reports
    pub level: String,
    /// Number of matches to run
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Tick limit per match
    pub max_ticks: u64,
    /// Player policy
    pub autopilot: Autopilot,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            level: "lane".to_string(),
            game_count: 20,
            parallel_games: 0,
            seed_start: 0,
            max_ticks: 36_000, // 10 minutes at 60 tps
            autopilot: Autopilot::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for a level
    pub fn new(level: &str, game_count: u32) -> Self {
        Self {
            level: level.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the tick limit
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Set the player policy
    pub fn with_autopilot(mut self, autopilot: Autopilot) -> Self {
        self.autopilot = autopilot;
        self
    }
}

/// Result of one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Index within the batch
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// How the match ended
    pub result: GameResult,
    /// Ticks played
    pub ticks: u64,
    /// Wave reached
    pub wave: u32,
    /// Lives left
    pub lives: u32,
    /// Extraction progress at the end, 0 to 100
    pub extraction_pct: u32,
    /// Commands the autopilot got accepted
    pub commands_accepted: u32,
    /// Hash of the final state
    pub final_state_hash: u64,
}

/// Aggregate over a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches that finished without error
    pub total_games: u32,
    /// Extraction victories
    pub victories: u32,
    /// Hero losses
    pub hero_lost: u32,
    /// Lives exhausted
    pub overrun: u32,
    /// Tick limit reached
    pub timeouts: u32,
    /// Victories over total games
    pub victory_rate: f64,
    /// Mean match length in ticks
    pub avg_ticks: f64,
    /// Mean wave reached
    pub avg_wave: f64,
}

impl BatchSummary {
    /// Aggregate per-match results
    pub fn from_games(games: &[GameSummary]) -> Self {
        let mut summary = Self {
            total_games: games.len() as u32,
            ..Self::default()
        };
        if games.is_empty() {
            return summary;
        }

        for game in games {
            match game.result {
                GameResult::Victory => summary.victories += 1,
                GameResult::HeroLost => summary.hero_lost += 1,
                GameResult::Overrun => summary.overrun += 1,
                GameResult::Timeout => summary.timeouts += 1,
            }
        }
        let n = games.len() as f64;
        summary.victory_rate = f64::from(summary.victories) / n;
        summary.avg_ticks = games.iter().map(|g| g.ticks as f64).sum::<f64>() / n;
        summary.avg_wave = games.iter().map(|g| f64::from(g.wave)).sum::<f64>() / n;
        summary
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match results, in index order
    pub games: Vec<GameSummary>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Play one match to its end or the tick limit.
pub fn run_single_game(
    grid: &Grid,
    game: &GameConfig,
    config: &BatchConfig,
    game_index: u32,
) -> Result<GameSummary, BatchError> {
    let seed = config.seed_start.wrapping_add(u64::from(game_index));
    let mut sim =
        Simulation::new(grid.clone(), game.clone().with_seed(seed)).map_err(|e| BatchError {
            game_index,
            seed,
            message: e.to_string(),
        })?;

    let mut commands_accepted = 0;
    while sim.tick_count() < config.max_ticks && !sim.status().is_over() {
        if config.autopilot.step(&mut sim).is_some() {
            commands_accepted += 1;
        }
        sim.tick();
    }

    Ok(GameSummary {
        game_index,
        seed,
        result: GameResult::from_status(sim.status()).unwrap_or(GameResult::Timeout),
        ticks: sim.tick_count(),
        wave: sim.waves().wave(),
        lives: sim.lives(),
        extraction_pct: sim.snapshot().extraction.progress_pct,
        commands_accepted,
        final_state_hash: sim.state_hash(),
    })
}

/// Run a batch of matches on `grid`.
pub fn run_batch(grid: &Grid, game: &GameConfig, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} matches of '{}' with {:?}",
        config.game_count, config.level, config.autopilot
    );

    let play = || -> Vec<Result<GameSummary, BatchError>> {
        (0..config.game_count)
            .into_par_iter()
            .map(|i| {
                let result = run_single_game(grid, game, &config, i);
                match &result {
                    Ok(_) => {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if done % 10 == 0 {
                            debug!("Progress: {}/{}", done, config.game_count);
                        }
                    }
                    Err(e) => warn!("Match {} failed: {}", i, e.message),
                }
                result
            })
            .collect()
    };

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(e) => {
                warn!("Thread pool unavailable ({}), using the global pool", e);
                play()
            }
        }
    } else {
        play()
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameSummary> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s, {:.0}% victories",
        games.len(),
        duration_seconds,
        summary.victory_rate * 100.0
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same seed `runs` times and check every run ends identically.
pub fn verify_determinism(
    grid: &Grid,
    game: &GameConfig,
    config: &BatchConfig,
    runs: u32,
) -> bool {
    let mut first: Option<GameSummary> = None;
    for _ in 0..runs {
        let Ok(summary) = run_single_game(grid, game, config, 0) else {
            return false;
        };
        match &first {
            Some(expected) if *expected != summary => return false,
            Some(_) => {}
            None => first = Some(summary),
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::grid::{GridPos, TileKind};
    use td_test_utils::fixtures::lane_level;

    fn quick(count: u32) -> BatchConfig {
        BatchConfig::new("lane", count).with_max_ticks(900)
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("lane", 50)
            .with_seed(12345)
            .with_autopilot(Autopilot::Extract);
        assert_eq!(config.game_count, 50);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.autopilot, Autopilot::Extract);
        assert_eq!(config.max_ticks, 36_000);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(&lane_level(), &GameConfig::default(), quick(4));
        assert_eq!(results.games.len(), 4);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 4);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![0, 1, 2, 3]);
        assert!(results.games.iter().all(|g| g.ticks <= 900));
    }

    #[test]
    fn test_limited_pool_matches_default_pool() {
        let grid = lane_level();
        let game = GameConfig::default();
        let mut limited = quick(3);
        limited.parallel_games = 1;
        let a = run_batch(&grid, &game, limited);
        let b = run_batch(&grid, &game, quick(3));
        assert_eq!(a.games, b.games);
    }

    #[test]
    fn test_unplayable_level_reports_errors() {
        let mut grid = lane_level();
        grid.set(GridPos::new(0, 0), TileKind::Empty);
        let results = run_batch(&grid, &GameConfig::default(), quick(2));
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 2);
        assert_eq!(results.summary, BatchSummary::default());
    }

    #[test]
    fn test_timeouts_are_counted() {
        let config = BatchConfig::new("lane", 1)
            .with_max_ticks(10)
            .with_autopilot(Autopilot::Passive);
        let results = run_batch(&lane_level(), &GameConfig::default(), config);
        assert_eq!(results.games[0].result, GameResult::Timeout);
        assert_eq!(results.games[0].ticks, 10);
        assert_eq!(results.summary.timeouts, 1);
        assert_eq!(results.games[0].commands_accepted, 0);
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(
            &lane_level(),
            &GameConfig::default(),
            &quick(1).with_seed(12345),
            3
        ));
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(&lane_level(), &GameConfig::default(), quick(2));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.level, "lane");
    }
}
