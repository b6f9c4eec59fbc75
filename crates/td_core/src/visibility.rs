//! Fog of war.
//!
//! Visibility is a per-tick snapshot: the grid starts dark every tick and
//! each [`VisionSource`] lights the tiles it covers. Nothing is
//! remembered, so a tile goes dark again as soon as no source reaches it.

use serde::{Deserialize, Serialize};

use crate::components::Facing;
use crate::grid::GridPos;

/// Something that reveals tiles this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionSource {
    /// Every tile whose centre lies within `radius` of `center`.
    Disc {
        /// Centre tile.
        center: GridPos,
        /// Radius in tiles.
        radius: u32,
    },
    /// A forward cone that widens by one tile on each side every two steps.
    Cone {
        /// Apex tile (not itself revealed by the cone).
        origin: GridPos,
        /// Direction of the cone.
        facing: Facing,
        /// Depth in tiles.
        length: u32,
    },
}

/// Boolean visibility mask over the grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FogGrid {
    width: u32,
    height: u32,
    visible: Vec<bool>,
}

impl FogGrid {
    /// Fully dark mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            visible: vec![false; (width as usize) * (height as usize)],
        }
    }

    /// Build a mask lit by `sources`.
    #[must_use]
    pub fn compute(width: u32, height: u32, sources: &[VisionSource]) -> Self {
        let mut fog = Self::new(width, height);
        for source in sources {
            match *source {
                VisionSource::Disc { center, radius } => fog.reveal_disc(center, radius),
                VisionSource::Cone {
                    origin,
                    facing,
                    length,
                } => fog.reveal_cone(origin, facing, length),
            }
        }
        fog
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

    /// True when the tile is lit. Out-of-bounds tiles are never visible.
    #[must_use]
    pub fn is_visible(&self, pos: GridPos) -> bool {
        self.index(pos).is_some_and(|i| self.visible[i])
    }

    /// Number of lit tiles.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    /// Copy out as rows (outer index is `y`).
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<bool>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.visible
            .chunks(self.width as usize)
            .map(<[bool]>::to_vec)
            .collect()
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        (pos.x < self.width && pos.y < self.height)
            .then(|| (pos.y as usize) * (self.width as usize) + (pos.x as usize))
    }

    fn reveal(&mut self, x: i64, y: i64) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if let Some(i) = self.index(GridPos::new(x, y)) {
            self.visible[i] = true;
        }
    }

    /// Light every tile within `radius` (Euclidean, inclusive) of `center`.
    pub fn reveal_disc(&mut self, center: GridPos, radius: u32) {
        let r = i64::from(radius);
        let (cx, cy) = (i64::from(center.x), i64::from(center.y));
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.reveal(cx + dx, cy + dy);
                }
            }
        }
    }

    /// Light a cone `length` tiles deep in front of `origin`.
    ///
    /// At depth `d` the cone spans `d / 2` tiles on either side of the
    /// centre line.
    pub fn reveal_cone(&mut self, origin: GridPos, facing: Facing, length: u32) {
        let (fx, fy) = facing.delta();
        let (fx, fy) = (i64::from(fx), i64::from(fy));
        // Perpendicular axis.
        let (px, py) = (-fy, fx);
        let (ox, oy) = (i64::from(origin.x), i64::from(origin.y));

        for depth in 1..=i64::from(length) {
            let half = depth / 2;
            for side in -half..=half {
                self.reveal(ox + fx * depth + px * side, oy + fy * depth + py * side);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disc_radius_is_euclidean() {
        let mut fog = FogGrid::new(11, 11);
        fog.reveal_disc(GridPos::new(5, 5), 2);
        assert!(fog.is_visible(GridPos::new(7, 5)));
        assert!(fog.is_visible(GridPos::new(6, 6)));
        assert!(!fog.is_visible(GridPos::new(7, 7)));
        // 1 + 4 * (2 + 1) + 4 * 1
        assert_eq!(fog.visible_count(), 13);
    }

    #[test]
    fn test_disc_clips_at_edges() {
        let mut fog = FogGrid::new(3, 3);
        fog.reveal_disc(GridPos::new(0, 0), 1);
        assert_eq!(fog.visible_count(), 3);
        assert!(!fog.is_visible(GridPos::new(5, 5)));
    }

    #[test]
    fn test_cone_widens_with_depth() {
        let mut fog = FogGrid::new(20, 20);
        fog.reveal_cone(GridPos::new(10, 10), Facing::Right, 4);
        assert!(!fog.is_visible(GridPos::new(10, 10)));
        assert!(fog.is_visible(GridPos::new(11, 10)));
        assert!(!fog.is_visible(GridPos::new(11, 11)));
        assert!(fog.is_visible(GridPos::new(12, 11)));
        assert!(fog.is_visible(GridPos::new(14, 8)));
        assert!(!fog.is_visible(GridPos::new(9, 10)));
        // depths 1..=4 span 1, 3, 3, 5 tiles
        assert_eq!(fog.visible_count(), 12);
    }

    #[test]
    fn test_compute_starts_dark_every_time() {
        let lit = FogGrid::compute(
            5,
            5,
            &[VisionSource::Disc {
                center: GridPos::new(0, 0),
                radius: 1,
            }],
        );
        assert!(lit.is_visible(GridPos::new(1, 0)));

        let dark = FogGrid::compute(5, 5, &[]);
        assert_eq!(dark.visible_count(), 0);
    }

    #[test]
    fn test_rows_shape() {
        let fog = FogGrid::new(4, 2);
        let rows = fog.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 4);
    }
}
