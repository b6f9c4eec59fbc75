//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation positions, speeds and ranges use fixed-point
//! arithmetic so a tick produces bit-identical results on every host.
//! One world unit equals one grid tile; the centre of tile `(x, y)` is
//! the world point `(x, y)`.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use crate::grid::GridPos;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Milliseconds per simulated second.
const MS_PER_SECOND: i32 = 1000;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// World position of a tile centre.
    #[must_use]
    pub fn from_grid(pos: GridPos) -> Self {
        Self::new(Fixed::from_num(pos.x), Fixed::from_num(pos.y))
    }

    /// Tile containing this point (nearest tile centre).
    ///
    /// Returns `None` for points left of or above the grid origin.
    #[must_use]
    pub fn to_grid(self) -> Option<GridPos> {
        let half = Fixed::from_num(0.5);
        let x = (self.x + half).floor();
        let y = (self.y + half).floor();
        if x < Fixed::ZERO || y < Fixed::ZERO {
            return None;
        }
        Some(GridPos::new(x.to_num::<u32>(), y.to_num::<u32>()))
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// True when `other` lies within `radius` of this point (inclusive).
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) <= radius.saturating_mul(radius)
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Scale both components.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Step toward `target` by at most `max_step`.
    ///
    /// Returns the new position and whether the target was reached.
    /// Never overshoots.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: Fixed) -> (Self, bool) {
        let remaining = self.distance(target);
        if remaining <= max_step {
            return (target, true);
        }
        let dir = (target - self).normalize();
        (self + dir.scale(max_step), false)
    }
}

/// Distance covered in one step of `dt_ms` at `speed` units per second.
#[must_use]
pub fn step_distance(speed: Fixed, dt_ms: u32) -> Fixed {
    speed * Fixed::from_num(dt_ms) / Fixed::from_num(MS_PER_SECOND)
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    #[test]
    fn test_vec2_distance_squared() {
        let dist_sq = vec2(3, 0).distance_squared(vec2(0, 4));
        // 3² + 4² = 25
        assert_eq!(dist_sq, Fixed::from_num(25));
    }

    #[test]
    fn test_distance_is_close_to_exact() {
        let d = vec2(3, 0).distance(vec2(0, 4));
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((d - Fixed::from_num(5)).abs() < epsilon, "got {d:?}");
    }

    #[test]
    fn test_within_is_inclusive() {
        assert!(vec2(0, 0).within(vec2(3, 0), Fixed::from_num(3)));
        assert!(!vec2(0, 0).within(vec2(3, 1), Fixed::from_num(3)));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = vec2(3, 4).normalize();
        let len_sq = norm.dot(norm);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((len_sq - Fixed::ONE).abs() < epsilon, "len² = {len_sq:?}");
    }

    #[test]
    fn test_move_towards_never_overshoots() {
        let (pos, arrived) = vec2(0, 0).move_towards(vec2(1, 0), Fixed::from_num(5));
        assert!(arrived);
        assert_eq!(pos, vec2(1, 0));

        let (pos, arrived) = vec2(0, 0).move_towards(vec2(10, 0), Fixed::from_num(2));
        assert!(!arrived);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((pos.x - Fixed::from_num(2)).abs() < epsilon);
        assert_eq!(pos.y, Fixed::ZERO);
    }

    #[test]
    fn test_grid_conversion_rounds_to_nearest_tile() {
        let p = Vec2Fixed::new(Fixed::from_num(2.4), Fixed::from_num(2.6));
        assert_eq!(p.to_grid(), Some(GridPos::new(2, 3)));
        assert_eq!(Vec2Fixed::from_grid(GridPos::new(4, 1)), vec2(4, 1));
        assert_eq!(Vec2Fixed::new(Fixed::from_num(-0.7), Fixed::ZERO).to_grid(), None);
    }

    #[test]
    fn test_step_distance() {
        // 2.5 tiles/s over 400 ms = 1 tile
        assert_eq!(step_distance(Fixed::from_num(2.5), 400), Fixed::ONE);
    }
}
