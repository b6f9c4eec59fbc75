//! Headless tower-defense match runner.
//!
//! Runs matches without graphics, controlled via JSON on stdin/stdout.
//! Designed for scripted controllers, CI testing and balance runs.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read requests from stdin
//! cargo run -p td_headless -- run --level assets/levels/lane.json
//!
//! # Run batch balance test
//! cargo run -p td_headless -- batch --count 200 --autopilot extract --output results/
//!
//! # Print the board after a minute of autopilot play
//! cargo run -p td_headless -- render --ticks 3600
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON requests, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for the request/response format.

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use td_core::data::GameConfig;
use td_core::grid::Grid;
use td_core::level::LevelData;
use td_core::simulation::Simulation;
use td_headless::autopilot::Autopilot;
use td_headless::batch::{run_batch, verify_determinism, BatchConfig};
use td_headless::level_loader::{load_config, load_grid};
use td_headless::runner::{HeadlessConfig, HeadlessRunner};
use td_headless::{render_ascii, AsciiConfig};

const DEFAULT_LEVEL: &str = "assets/levels/lane.json";

#[derive(Parser)]
#[command(name = "td_headless")]
#[command(about = "Headless tower-defense runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Level file (.json or .ron)
    #[arg(short, long, global = true, default_value = DEFAULT_LEVEL)]
    level: PathBuf,

    /// Game config file (.ron); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match driven by stdin
    Run {
        /// Override the config seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,
    },

    /// Run a batch of autopilot matches for balance testing
    Batch {
        /// Number of matches to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit per match
        #[arg(long, default_value = "36000")]
        max_ticks: u64,

        /// Player policy
        #[arg(long, value_enum, default_value_t = Autopilot::Defend)]
        autopilot: Autopilot,
    },

    /// Play with the autopilot and print the board as ASCII
    Render {
        /// Ticks to play before rendering
        #[arg(short, long, default_value = "0")]
        ticks: u64,

        /// Override the config seed
        #[arg(long)]
        seed: Option<u64>,

        /// Player policy
        #[arg(long, value_enum, default_value_t = Autopilot::Defend)]
        autopilot: Autopilot,

        /// Disable colors
        #[arg(long)]
        no_color: bool,

        /// Show tiles outside vision
        #[arg(long)]
        no_fog: bool,
    },

    /// Verify determinism by replaying one seed several times
    Verify {
        /// Seed to replay
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value = "36000")]
        max_ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the protocol.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let (level, grid, game) = load_or_exit(&cli.level, cli.config.as_deref());

    match cli.command {
        Some(Commands::Run { seed, auto_state }) => {
            cmd_run(&level, grid, with_seed(game, seed), auto_state);
        }
        Some(Commands::Batch {
            count,
            parallel,
            output,
            seed,
            max_ticks,
            autopilot,
        }) => {
            let config = BatchConfig {
                level: level.id.clone(),
                game_count: count,
                parallel_games: parallel,
                seed_start: seed,
                max_ticks,
                autopilot,
            };
            cmd_batch(&grid, &game, config, &output);
        }
        Some(Commands::Render {
            ticks,
            seed,
            autopilot,
            no_color,
            no_fog,
        }) => {
            let config = AsciiConfig {
                show_fog: !no_fog,
                use_color: !no_color,
                ..AsciiConfig::default()
            };
            cmd_render(grid, with_seed(game, seed), ticks, autopilot, &config);
        }
        Some(Commands::Verify {
            seed,
            runs,
            max_ticks,
        }) => {
            cmd_verify(&grid, &game, seed, runs, max_ticks);
        }
        None => cmd_run(&level, grid, game, false),
    }
}

fn load_or_exit(level: &Path, config: Option<&Path>) -> (LevelData, Grid, GameConfig) {
    let loaded = load_grid(level).and_then(|(data, grid)| {
        let game = load_config(config)?;
        Ok((data, grid, game))
    });
    match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, level = %level.display(), "Failed to load match data");
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    }
}

fn with_seed(game: GameConfig, seed: Option<u64>) -> GameConfig {
    match seed {
        Some(seed) => game.with_seed(seed),
        None => game,
    }
}

/// Run a single interactive match
fn cmd_run(level: &LevelData, grid: Grid, game: GameConfig, auto_state: bool) {
    tracing::info!(level = %level.name, "Starting interactive session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
        ..HeadlessConfig::default()
    };
    let mut runner = match HeadlessRunner::new(level.id.clone(), grid, game, config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    };

    let stdin = io::stdin();
    if let Err(e) = runner.run(stdin.lock(), io::stdout().lock()) {
        tracing::error!(error = %e, "Session ended with an I/O error");
        process::exit(1);
    }
}

/// Run a batch of matches for balance testing
fn cmd_batch(grid: &Grid, game: &GameConfig, config: BatchConfig, output: &Path) {
    if let Err(e) = std::fs::create_dir_all(output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!("FATAL: Cannot create output directory '{}': {e}", output.display());
        process::exit(1);
    }

    let results = run_batch(grid, game, config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {e}");
        process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", summary.total_games);
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("\nOutcomes:");
    eprintln!("  victory:   {}", summary.victories);
    eprintln!("  hero lost: {}", summary.hero_lost);
    eprintln!("  overrun:   {}", summary.overrun);
    eprintln!("  timeout:   {}", summary.timeouts);
    eprintln!(
        "\nVictory rate {:.1}%, mean wave {:.1}, mean length {:.0} ticks",
        summary.victory_rate * 100.0,
        summary.avg_wave,
        summary.avg_ticks
    );

    for error in results.errors.iter().take(10) {
        eprintln!(
            "  Match {} (seed {}): {}",
            error.game_index, error.seed, error.message
        );
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Play with the autopilot, then print the board
fn cmd_render(
    grid: Grid,
    game: GameConfig,
    ticks: u64,
    autopilot: Autopilot,
    config: &AsciiConfig,
) {
    let mut sim = match Simulation::new(grid, game) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    };
    while sim.tick_count() < ticks && !sim.status().is_over() {
        autopilot.step(&mut sim);
        sim.tick();
    }
    print!("{}", render_ascii(&sim.snapshot(), config));
}

/// Verify determinism
fn cmd_verify(grid: &Grid, game: &GameConfig, seed: u64, runs: u32, max_ticks: u64) {
    tracing::info!("Verifying determinism: seed {} ({} runs)", seed, runs);

    let config = BatchConfig::new("verify", 1)
        .with_seed(seed)
        .with_max_ticks(max_ticks);
    if verify_determinism(grid, game, &config, runs) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        process::exit(1);
    }
}
