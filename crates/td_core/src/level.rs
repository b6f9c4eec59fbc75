//! Level documents and pre-match layout validation.
//!
//! A level is a named document holding the grid dimensions and a 2D array
//! of tile-kind names. The core never reads files; adapters parse the
//! document (JSON or RON) and hand the resulting [`LevelData`] over.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{Grid, GridPos, TileKind};
use crate::pathfinding::{find_path, Traversal};

/// Persisted level document.
///
/// ```json
/// { "id": "corridor", "name": "Corridor", "width": 3, "height": 1,
///   "tiles": [["spawn", "path", "base"]] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Stable identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Tiles, outer index is the row.
    pub tiles: Vec<Vec<TileKind>>,
}

impl LevelData {
    /// Capture a grid as a document.
    #[must_use]
    pub fn from_grid(id: impl Into<String>, name: impl Into<String>, grid: &Grid) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width: grid.width(),
            height: grid.height(),
            tiles: grid.rows(),
        }
    }

    /// Build the grid described by this document.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevel`] if the declared dimensions do not
    /// match the tile array.
    pub fn to_grid(&self) -> Result<Grid> {
        if self.tiles.len() != self.height as usize {
            return Err(GameError::InvalidLevel(format!(
                "declared height {} but found {} rows",
                self.height,
                self.tiles.len()
            )));
        }
        let grid = Grid::from_rows(self.tiles.clone())?;
        if grid.width() != self.width {
            return Err(GameError::InvalidLevel(format!(
                "declared width {} but rows hold {} tiles",
                self.width,
                grid.width()
            )));
        }
        Ok(grid)
    }
}

/// A spawn tile and its pre-computed route to the base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnRoute {
    /// Spawn tile.
    pub spawn: GridPos,
    /// Route from the spawn to the base, both ends inclusive.
    pub route: Vec<GridPos>,
}

/// Objectives found on a playable grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableLayout {
    /// The base (first base tile in row-major order).
    pub base: GridPos,
    /// Every spawn that reaches the base.
    pub routes: Vec<SpawnRoute>,
    /// Extraction objectives.
    pub extraction_points: Vec<GridPos>,
}

/// Check that a match can start on `grid`.
///
/// Spawns that cannot reach the base over route tiles are dropped with a
/// warning; at least one connected spawn is required.
///
/// # Errors
///
/// [`GameError::NoBase`], [`GameError::NoSpawn`] or [`GameError::NoRoute`].
pub fn validate_playable(grid: &Grid) -> Result<PlayableLayout> {
    let base = grid.find_first(TileKind::Base).ok_or(GameError::NoBase)?;
    let spawns = grid.positions_of(TileKind::Spawn);
    if spawns.is_empty() {
        return Err(GameError::NoSpawn);
    }

    let mut routes = Vec::with_capacity(spawns.len());
    for spawn in spawns {
        match find_path(grid, spawn, base, Traversal::Route) {
            Some(route) => routes.push(SpawnRoute { spawn, route }),
            None => tracing::warn!(%spawn, %base, "Spawn has no route to the base; ignoring it"),
        }
    }

    if routes.is_empty() {
        return Err(GameError::NoRoute { base });
    }

    Ok(PlayableLayout {
        base,
        routes,
        extraction_points: grid.positions_of(TileKind::ExtractionPoint),
    })
}
