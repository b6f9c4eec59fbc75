//! Data validation utilities.
//!
//! Unlike match start, which stops at the first failure, validation
//! collects every problem in a document so authors can fix them in one go.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use td_core::data::GameConfig;
use td_core::error::GameError;
use td_core::grid::{GridPos, TileKind};
use td_core::level::LevelData;
use td_core::pathfinding::{find_path, Traversal};

/// Errors that stop validation of a file outright.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON document did not parse.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// RON document did not parse.
    #[error("Invalid RON: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON output could not be produced.
    #[error("RON output failed: {0}")]
    RonWrite(#[from] ron::Error),

    /// The core rejected the document.
    #[error(transparent)]
    Game(#[from] GameError),

    /// File extension is neither `.json` nor `.ron`.
    #[error("Unsupported format '{}'", .0.display())]
    UnsupportedFormat(PathBuf),

    /// One or more documents have fatal problems.
    #[error("{failed} of {checked} documents failed validation")]
    Failed {
        /// Documents with at least one fatal problem.
        failed: usize,
        /// Documents checked.
        checked: usize,
    },
}

/// A single finding in a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Problem {
    /// Declared dimensions disagree with the tile array.
    #[error("{0}")]
    Dimensions(String),
    /// No base tile.
    #[error("no base tile")]
    NoBase,
    /// More than one base tile; only the first is used.
    #[error("{0} base tiles, only the first one is used")]
    ExtraBases(usize),
    /// No spawn tile.
    #[error("no spawn tile")]
    NoSpawn,
    /// A spawn without a route to the base.
    #[error("spawn at {0} has no route to the base")]
    UnreachableSpawn(GridPos),
    /// No extraction point; the match cannot be won.
    #[error("no extraction point, the match cannot be won")]
    NoExtractionPoint,
    /// A tunable that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    /// A percentage above 100.
    #[error("{0} must be at most 100")]
    OverHundred(&'static str),
    /// Enemy targeting has no categories.
    #[error("target_priority is empty")]
    EmptyTargetPriority,
    /// A scripted wave lists no enemy types.
    #[error("scripted wave {0} has no enemy types")]
    EmptyWaveTypes(usize),
}

impl Problem {
    /// True when the document cannot be used as is.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ExtraBases(_) | Self::NoExtractionPoint)
    }
}

/// Kind of document checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Level layout.
    Level,
    /// Game config.
    Config,
}

/// Findings for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// File checked.
    pub path: PathBuf,
    /// What the file holds.
    pub kind: DocumentKind,
    /// Everything found, fatal or not.
    pub problems: Vec<Problem>,
}

impl Report {
    /// True when no problem is fatal.
    pub fn is_ok(&self) -> bool {
        !self.problems.iter().any(Problem::is_fatal)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_ok() { "ok" } else { "FAILED" };
        write!(f, "{} [{:?}] {}", self.path.display(), self.kind, status)?;
        for problem in &self.problems {
            let level = if problem.is_fatal() { "error" } else { "warning" };
            write!(f, "\n  {level}: {problem}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Check a level document.
pub fn validate_level(level: &LevelData) -> Vec<Problem> {
    let grid = match level.to_grid() {
        Ok(grid) => grid,
        Err(GameError::InvalidLevel(message)) => return vec![Problem::Dimensions(message)],
        Err(e) => return vec![Problem::Dimensions(e.to_string())],
    };

    let mut problems = Vec::new();
    let bases = grid.positions_of(TileKind::Base);
    if bases.len() > 1 {
        problems.push(Problem::ExtraBases(bases.len()));
    }
    let spawns = grid.positions_of(TileKind::Spawn);
    if spawns.is_empty() {
        problems.push(Problem::NoSpawn);
    }

    match bases.first() {
        Some(&base) => {
            for spawn in spawns {
                if find_path(&grid, spawn, base, Traversal::Route).is_none() {
                    problems.push(Problem::UnreachableSpawn(spawn));
                }
            }
        }
        None => problems.push(Problem::NoBase),
    }

    if grid.find_first(TileKind::ExtractionPoint).is_none() {
        problems.push(Problem::NoExtractionPoint);
    }
    problems
}

/// Check config tunables the simulation relies on.
pub fn validate_config(config: &GameConfig) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut positive = |value: u64, field: &'static str| {
        if value == 0 {
            problems.push(Problem::Zero(field));
        }
    };
    positive(u64::from(config.starting_lives), "starting_lives");
    positive(u64::from(config.waves.base_count), "waves.base_count");
    positive(u64::from(config.waves.min_interval_ms), "waves.min_interval_ms");
    positive(config.extraction.duration_ms, "extraction.duration_ms");
    positive(u64::from(config.drones.build_rate), "drones.build_rate");
    positive(
        u64::from(config.drones.repair_hp_per_metal),
        "drones.repair_hp_per_metal",
    );
    positive(
        u64::from(config.structures.turret.max_level),
        "structures.turret.max_level",
    );
    positive(
        u64::from(config.structures.sniper.max_level),
        "structures.sniper.max_level",
    );

    if config.economy.sell_refund_pct > 100 {
        problems.push(Problem::OverHundred("economy.sell_refund_pct"));
    }
    for (field, pct) in [
        ("structures.turret.crit_chance_pct", config.structures.turret.crit_chance_pct),
        ("structures.sniper.crit_chance_pct", config.structures.sniper.crit_chance_pct),
        ("hero.crit_chance_pct", config.hero.crit_chance_pct),
    ] {
        if pct > 100 {
            problems.push(Problem::OverHundred(field));
        }
    }
    if config.target_priority.is_empty() {
        problems.push(Problem::EmptyTargetPriority);
    }
    for (i, plan) in config.waves.scripted.iter().enumerate() {
        if plan.types.is_empty() {
            problems.push(Problem::EmptyWaveTypes(i + 1));
        }
    }
    problems
}

// ============================================================================
// Files
// ============================================================================

/// Parse a level file, choosing the format by extension.
///
/// # Errors
///
/// IO and parse failures, or an unsupported extension.
pub fn read_level(path: &Path) -> Result<LevelData, ValidationError> {
    let text = fs::read_to_string(path)?;
    match extension(path) {
        Some("json") => Ok(serde_json::from_str(&text)?),
        Some("ron") => Ok(ron::from_str(&text)?),
        _ => Err(ValidationError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Validate a level file.
///
/// # Errors
///
/// Only when the file cannot be read or parsed; layout problems are
/// reported in the [`Report`].
pub fn validate_level_file(path: &Path) -> Result<Report, ValidationError> {
    let level = read_level(path)?;
    Ok(Report {
        path: path.to_path_buf(),
        kind: DocumentKind::Level,
        problems: validate_level(&level),
    })
}

/// Validate a RON config file.
///
/// # Errors
///
/// Only when the file cannot be read or parsed.
pub fn validate_config_file(path: &Path) -> Result<Report, ValidationError> {
    let text = fs::read_to_string(path)?;
    let config = GameConfig::from_ron_str(&text)?;
    Ok(Report {
        path: path.to_path_buf(),
        kind: DocumentKind::Config,
        problems: validate_config(&config),
    })
}

/// Convert a level between JSON and RON, by the output extension.
///
/// # Errors
///
/// IO, parse or serialization failures, an unsupported extension, or a
/// document whose dimensions do not match its tiles.
pub fn convert_level(input: &Path, output: &Path) -> Result<LevelData, ValidationError> {
    let level = read_level(input)?;
    level.to_grid()?;
    let text = match extension(output) {
        Some("json") => serde_json::to_string_pretty(&level)?,
        Some("ron") => ron::ser::to_string_pretty(&level, ron::ser::PrettyConfig::default())?,
        _ => return Err(ValidationError::UnsupportedFormat(output.to_path_buf())),
    };
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, text)?;
    Ok(level)
}

/// Validate every level under `levels/` and config under `config/`.
///
/// Files are checked in name order. Unparseable files count as failed
/// reports rather than aborting the run.
///
/// # Errors
///
/// Returns an error if a directory cannot be read or any document fails.
pub fn validate_data_directory(path: &Path) -> Result<Vec<Report>, ValidationError> {
    let mut reports = Vec::new();
    for (dir, kind) in [
        ("levels", DocumentKind::Level),
        ("config", DocumentKind::Config),
    ] {
        let dir = path.join(dir);
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "No directory, skipping");
            continue;
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| matches!(extension(p), Some("json" | "ron")))
            .collect();
        files.sort();

        for file in files {
            let result = match kind {
                DocumentKind::Level => validate_level_file(&file),
                DocumentKind::Config => validate_config_file(&file),
            };
            let report = result.unwrap_or_else(|e| {
                tracing::warn!(file = %file.display(), error = %e, "Unreadable document");
                Report {
                    path: file.clone(),
                    kind,
                    problems: vec![Problem::Dimensions(e.to_string())],
                }
            });
            tracing::info!("{report}");
            reports.push(report);
        }
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        return Err(ValidationError::Failed {
            failed,
            checked: reports.len(),
        });
    }
    Ok(reports)
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}
