//! Tile grid: the static map the editor produces and the simulation reads.
//!
//! The grid is mutated in-game only by construction completion, selling,
//! restoring abandoned buildings and clearing rubble. Every mutation is
//! reported as a [`TileChange`] so the external grid owner can mirror it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Default editor grid width in tiles.
pub const DEFAULT_WIDTH: u32 = 40;

/// Default editor grid height in tiles.
pub const DEFAULT_HEIGHT: u32 = 30;

/// Kind of a single grid tile.
///
/// Closed set; every match over it is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Open ground.
    #[default]
    Empty,
    /// Enemy route tile.
    Path,
    /// Impassable.
    Wall,
    /// Player base (enemy objective).
    Base,
    /// Enemy spawn point.
    Spawn,
    /// Standard turret.
    Turret,
    /// Sniper turret.
    Sniper,
    /// Debris that can be cleared for a fee.
    Rubble,
    /// Stone deposit (quarry site, harvester source).
    ResourceStone,
    /// Metal deposit (forge site, harvester source).
    ResourceMetal,
    /// Stone-producing building.
    Quarry,
    /// Metal-producing building.
    Forge,
    /// Ruined quarry awaiting restoration.
    AbandonedQuarry,
    /// Ruined forge awaiting restoration.
    AbandonedForge,
    /// Building that houses worker and harvester drones.
    DroneFactory,
    /// Ruined drone factory awaiting restoration.
    AbandonedDroneFactory,
    /// Building that houses repair drones.
    MaintenanceHub,
    /// Scrap left on the map; cleared like rubble.
    Wreckage,
    /// Objective the hero holds to win.
    ExtractionPoint,
}

impl TileKind {
    /// Every tile kind, in declaration order.
    pub const ALL: [Self; 19] = [
        Self::Empty,
        Self::Path,
        Self::Wall,
        Self::Base,
        Self::Spawn,
        Self::Turret,
        Self::Sniper,
        Self::Rubble,
        Self::ResourceStone,
        Self::ResourceMetal,
        Self::Quarry,
        Self::Forge,
        Self::AbandonedQuarry,
        Self::AbandonedForge,
        Self::DroneFactory,
        Self::AbandonedDroneFactory,
        Self::MaintenanceHub,
        Self::Wreckage,
        Self::ExtractionPoint,
    ];

    /// Document name of this tile kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Path => "path",
            Self::Wall => "wall",
            Self::Base => "base",
            Self::Spawn => "spawn",
            Self::Turret => "turret",
            Self::Sniper => "sniper",
            Self::Rubble => "rubble",
            Self::ResourceStone => "resource_stone",
            Self::ResourceMetal => "resource_metal",
            Self::Quarry => "quarry",
            Self::Forge => "forge",
            Self::AbandonedQuarry => "abandoned_quarry",
            Self::AbandonedForge => "abandoned_forge",
            Self::DroneFactory => "drone_factory",
            Self::AbandonedDroneFactory => "abandoned_drone_factory",
            Self::MaintenanceHub => "maintenance_hub",
            Self::Wreckage => "wreckage",
            Self::ExtractionPoint => "extraction_point",
        }
    }

    /// Look up a tile kind by its document name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Tiles on the pre-computed enemy route: path, spawn, base.
    #[must_use]
    pub const fn is_route(self) -> bool {
        matches!(self, Self::Path | Self::Spawn | Self::Base)
    }

    /// Tiles an enemy may cross when hunting a target off the route.
    #[must_use]
    pub const fn is_enemy_passable(self) -> bool {
        matches!(
            self,
            Self::Path
                | Self::Spawn
                | Self::Base
                | Self::Empty
                | Self::ExtractionPoint
                | Self::Rubble
                | Self::ResourceStone
                | Self::ResourceMetal
        )
    }

    /// Player structures, active or abandoned.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(
            self,
            Self::Turret
                | Self::Sniper
                | Self::Quarry
                | Self::Forge
                | Self::AbandonedQuarry
                | Self::AbandonedForge
                | Self::DroneFactory
                | Self::AbandonedDroneFactory
                | Self::MaintenanceHub
        )
    }

    /// Ruined structures that can be restored with a repair command.
    #[must_use]
    pub const fn is_abandoned(self) -> bool {
        matches!(
            self,
            Self::AbandonedQuarry | Self::AbandonedForge | Self::AbandonedDroneFactory
        )
    }

    /// Active counterpart of an abandoned structure tile.
    #[must_use]
    pub const fn restored(self) -> Option<Self> {
        match self {
            Self::AbandonedQuarry => Some(Self::Quarry),
            Self::AbandonedForge => Some(Self::Forge),
            Self::AbandonedDroneFactory => Some(Self::DroneFactory),
            _ => None,
        }
    }

    /// Tiles the hero cannot walk onto.
    #[must_use]
    pub const fn blocks_hero(self) -> bool {
        matches!(self, Self::Wall) || self.is_structure()
    }

    /// Debris removed by the clear-rubble command.
    #[must_use]
    pub const fn is_debris(self) -> bool {
        matches!(self, Self::Rubble | Self::Wreckage)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPos {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl GridPos {
    /// Create a grid position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another tile.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True if `other` shares an edge with this tile.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }

    /// Step by a signed offset, `None` when it would leave the positive quadrant.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self::new(x, y))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single tile mutation emitted by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileChange {
    /// Tile that changed.
    pub pos: GridPos,
    /// New tile kind.
    pub kind: TileKind,
}

/// Receiver for in-match grid mutations (the external grid owner).
pub trait GridListener {
    /// Called once per tile mutation, in the order they happened.
    fn tile_changed(&mut self, change: TileChange);
}

/// Row-major tile array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
}

impl Grid {
    /// Create a grid filled with empty tiles.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![TileKind::Empty; (width as usize) * (height as usize)],
        }
    }

    /// Build a grid from rows (outer index is `y`).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLevel`] if the grid is empty or ragged.
    pub fn from_rows(rows: Vec<Vec<TileKind>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(GameError::InvalidLevel("grid has no tiles".into()));
        }
        if let Some(y) = rows.iter().position(|row| row.len() != width) {
            return Err(GameError::InvalidLevel(format!(
                "row {y} has {} tiles, expected {width}",
                rows[y].len()
            )));
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
            tiles: rows.into_iter().flatten().collect(),
        })
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, pos: GridPos) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    /// Check if a position is inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Tile at a position, `None` when out of bounds.
    #[must_use]
    pub fn get(&self, pos: GridPos) -> Option<TileKind> {
        if self.in_bounds(pos) {
            Some(self.tiles[self.index(pos)])
        } else {
            None
        }
    }

    /// Overwrite a tile. Returns false when out of bounds.
    pub fn set(&mut self, pos: GridPos, kind: TileKind) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = self.index(pos);
        self.tiles[idx] = kind;
        true
    }

    /// Apply a recorded mutation.
    pub fn apply(&mut self, change: TileChange) -> bool {
        self.set(change.pos, change.kind)
    }

    /// All tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, TileKind)> + '_ {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, kind)| (GridPos::new(i as u32 % width, i as u32 / width), *kind))
    }

    /// First tile of `kind` in row-major order.
    #[must_use]
    pub fn find_first(&self, kind: TileKind) -> Option<GridPos> {
        self.iter().find(|(_, k)| *k == kind).map(|(pos, _)| pos)
    }

    /// Every tile of `kind` in row-major order.
    #[must_use]
    pub fn positions_of(&self, kind: TileKind) -> Vec<GridPos> {
        self.iter()
            .filter(|(_, k)| *k == kind)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Copy out as rows (outer index is `y`).
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<TileKind>> {
        self.tiles
            .chunks(self.width as usize)
            .map(<[TileKind]>::to_vec)
            .collect()
    }
}

impl GridListener for Grid {
    fn tile_changed(&mut self, change: TileChange) {
        self.apply(change);
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::default();
        assert_eq!(grid.width(), DEFAULT_WIDTH);
        assert_eq!(grid.height(), DEFAULT_HEIGHT);
        assert!(grid.iter().all(|(_, k)| k == TileKind::Empty));
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new(5, 4);
        assert!(grid.set(GridPos::new(4, 3), TileKind::Wall));
        assert_eq!(grid.get(GridPos::new(4, 3)), Some(TileKind::Wall));
        assert!(!grid.set(GridPos::new(5, 0), TileKind::Wall));
        assert_eq!(grid.get(GridPos::new(0, 4)), None);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![TileKind::Empty; 3], vec![TileKind::Empty; 2]];
        assert!(matches!(Grid::from_rows(rows), Err(GameError::InvalidLevel(_))));
        assert!(Grid::from_rows(Vec::new()).is_err());
    }

    #[test]
    fn test_rows_roundtrip_preserves_layout() {
        let mut grid = Grid::new(3, 2);
        grid.set(GridPos::new(2, 1), TileKind::Base);
        let rebuilt = Grid::from_rows(grid.rows()).unwrap();
        assert_eq!(rebuilt, grid);
        assert_eq!(rebuilt.find_first(TileKind::Base), Some(GridPos::new(2, 1)));
    }

    #[test]
    fn test_tile_names_match_document_format() {
        for kind in TileKind::ALL {
            assert_eq!(TileKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(TileKind::from_name("lava"), None);
    }

    #[test]
    fn test_tile_classification() {
        assert!(TileKind::Path.is_route());
        assert!(!TileKind::Empty.is_route());
        assert!(TileKind::Empty.is_enemy_passable());
        assert!(!TileKind::Wall.is_enemy_passable());
        assert!(!TileKind::Turret.is_enemy_passable());
        assert!(TileKind::AbandonedForge.is_structure());
        assert_eq!(TileKind::AbandonedForge.restored(), Some(TileKind::Forge));
        assert_eq!(TileKind::Forge.restored(), None);
        assert!(TileKind::Sniper.blocks_hero());
        assert!(!TileKind::Rubble.blocks_hero());
    }

    #[test]
    fn test_offset_rejects_negative() {
        assert_eq!(GridPos::new(0, 3).offset(-1, 0), None);
        assert_eq!(GridPos::new(1, 3).offset(-1, 1), Some(GridPos::new(0, 4)));
    }

    #[test]
    fn test_listener_applies_change() {
        let mut grid = Grid::new(2, 2);
        grid.tile_changed(TileChange {
            pos: GridPos::new(1, 0),
            kind: TileKind::Turret,
        });
        assert_eq!(grid.get(GridPos::new(1, 0)), Some(TileKind::Turret));
    }
}
