//! Error types for the game simulation.
//!
//! Every failure is recoverable at the command boundary. Stale references
//! inside a tick are never errors; they are dropped where they occur.

use thiserror::Error;

use crate::economy::{Cost, Resources};
use crate::grid::{GridPos, TileKind};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The level has no base tile.
    #[error("Level has no base")]
    NoBase,

    /// The level has no spawn tile.
    #[error("Level has no enemy spawn")]
    NoSpawn,

    /// No spawn connects to the base through route tiles.
    #[error("No route from any spawn to the base at {base}")]
    NoRoute {
        /// Base tile.
        base: GridPos,
    },

    /// Level document is malformed.
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Coordinates fall outside the grid.
    #[error("Position {0} is outside the grid")]
    OutOfBounds(GridPos),

    /// The tile cannot host the requested action.
    #[error("Cannot {action} on {tile} at {pos}")]
    InvalidSite {
        /// Target tile.
        pos: GridPos,
        /// Tile kind found there.
        tile: TileKind,
        /// Attempted action.
        action: &'static str,
    },

    /// The tile is currently hidden by fog.
    #[error("Tile {0} is not visible")]
    Obscured(GridPos),

    /// A construction job is already queued for the tile.
    #[error("Construction already queued at {0}")]
    SiteOccupied(GridPos),

    /// Insufficient resources.
    #[error("Insufficient resources: need {required}, have {available}")]
    InsufficientResources {
        /// Full cost of the action.
        required: Cost,
        /// Ledger balance at the time of the attempt.
        available: Resources,
    },

    /// No turret exists at the tile.
    #[error("No turret at {0}")]
    NoTurret(GridPos),

    /// No building exists at the tile.
    #[error("No building at {0}")]
    NoBuilding(GridPos),

    /// Turret is already at its maximum level.
    #[error("Turret at {pos} is already level {level}")]
    MaxLevel {
        /// Turret tile.
        pos: GridPos,
        /// Current level.
        level: u32,
    },

    /// The structure is wrecked and must be repaired first.
    #[error("Structure at {0} is wrecked")]
    Wrecked(GridPos),

    /// The structure is already at full health.
    #[error("Structure at {0} needs no repair")]
    NothingToRepair(GridPos),

    /// The match has ended; only stop/query are accepted.
    #[error("The match is over")]
    MatchOver,

    /// No match is running.
    #[error("No match is running")]
    NotPlaying,

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path or label of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Stable key used to rate-limit identical user notices.
    ///
    /// Positions and ledger balances are left out, so repeating a failed
    /// action on another tile or after income arrives counts as the same
    /// notice.
    #[must_use]
    pub fn notice_key(&self) -> String {
        match self {
            Self::NoBase => "no_base".into(),
            Self::NoSpawn => "no_spawn".into(),
            Self::NoRoute { .. } => "no_route".into(),
            Self::InvalidLevel(_) => "invalid_level".into(),
            Self::OutOfBounds(_) => "out_of_bounds".into(),
            Self::InvalidSite { tile, action, .. } => format!("invalid_site:{action}:{tile}"),
            Self::Obscured(_) => "obscured".into(),
            Self::SiteOccupied(_) => "site_occupied".into(),
            Self::InsufficientResources { required, .. } => {
                format!("insufficient_resources:{required}")
            }
            Self::NoTurret(_) => "no_turret".into(),
            Self::NoBuilding(_) => "no_building".into(),
            Self::MaxLevel { .. } => "max_level".into(),
            Self::Wrecked(_) => "wrecked".into(),
            Self::NothingToRepair(_) => "nothing_to_repair".into(),
            Self::MatchOver => "match_over".into(),
            Self::NotPlaying => "not_playing".into(),
            Self::DataParseError { path, .. } => format!("data_parse_error:{path}"),
            Self::InvalidState(_) => "invalid_state".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_key_ignores_balance_and_position() {
        let short = |stone, metal| GameError::InsufficientResources {
            required: Cost::metal(50),
            available: Resources::new(stone, metal),
        };
        assert_eq!(short(0, 10).notice_key(), short(40, 20).notice_key());
        assert_eq!(
            GameError::NoTurret(GridPos::new(1, 1)).notice_key(),
            GameError::NoTurret(GridPos::new(4, 2)).notice_key()
        );
    }

    #[test]
    fn test_notice_key_separates_actions() {
        let expensive = GameError::InsufficientResources {
            required: Cost::metal(120),
            available: Resources::new(0, 10),
        };
        let cheap = GameError::InsufficientResources {
            required: Cost::metal(50),
            available: Resources::new(0, 10),
        };
        assert_ne!(expensive.notice_key(), cheap.notice_key());
        assert_ne!(
            GameError::NoTurret(GridPos::new(1, 1)).notice_key(),
            GameError::NoBuilding(GridPos::new(1, 1)).notice_key()
        );
    }
}
