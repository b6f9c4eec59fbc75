//! Level and config loading for headless runs.
//!
//! Levels are JSON documents (RON is accepted too, chosen by file
//! extension). Configs are RON files whose missing fields take defaults.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use td_core::data::GameConfig;
use td_core::error::GameError;
use td_core::grid::Grid;
use td_core::level::LevelData;

/// Errors that can occur while loading levels or configs.
#[derive(Debug, Error)]
pub enum LevelLoadError {
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON level document did not parse.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// RON document did not parse.
    #[error("Invalid RON: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// The document parsed but describes an unusable level or config.
    #[error(transparent)]
    Game(#[from] GameError),

    /// File extension is neither `.json` nor `.ron`.
    #[error("Unsupported level format '{}'", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Parse a JSON level document.
pub fn parse_level_json(text: &str) -> Result<LevelData, LevelLoadError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse a RON level document.
pub fn parse_level_ron(text: &str) -> Result<LevelData, LevelLoadError> {
    Ok(ron::from_str(text)?)
}

/// Load a level document, picking the parser by extension.
///
/// The document is checked for consistent dimensions before returning.
pub fn load_level(path: &Path) -> Result<LevelData, LevelLoadError> {
    let text = fs::read_to_string(path)?;
    let level = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_level_json(&text)?,
        Some("ron") => parse_level_ron(&text)?,
        _ => return Err(LevelLoadError::UnsupportedFormat(path.to_path_buf())),
    };
    level.to_grid()?;
    tracing::debug!(path = %path.display(), id = %level.id, "Loaded level");
    Ok(level)
}

/// Load a level and build its grid.
pub fn load_grid(path: &Path) -> Result<(LevelData, Grid), LevelLoadError> {
    let level = load_level(path)?;
    let grid = level.to_grid()?;
    Ok((level, grid))
}

/// Write a level document as pretty JSON.
pub fn save_level(path: &Path, level: &LevelData) -> Result<(), LevelLoadError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(level)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a RON config, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<GameConfig, LevelLoadError> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = fs::read_to_string(path)?;
    let config = GameConfig::from_ron_str(&text).map_err(|e| match e {
        GameError::DataParseError { message, .. } => GameError::DataParseError {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })?;
    tracing::debug!(path = %path.display(), seed = config.seed, "Loaded config");
    Ok(config)
}
