//! Grid-based pathfinding using the A* algorithm.
//!
//! Search is 4-directional with a Manhattan heuristic and unit step cost.
//! Open-set ties break on tile coordinates, so a fixed grid always yields
//! the same route.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridPos, TileKind};

/// Which tiles a search may step through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Traversal {
    /// Route tiles only: path, spawn, base. Used for spawn-to-base routes
    /// and pre-match validation.
    Route,
    /// Looser rules for enemies hunting an off-route target: any tile
    /// except walls and structures.
    Assault,
}

impl Traversal {
    /// Check whether a tile can be entered.
    #[must_use]
    pub const fn allows(self, kind: TileKind) -> bool {
        match self {
            Self::Route => kind.is_route(),
            Self::Assault => kind.is_enemy_passable(),
        }
    }
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    pos: GridPos,
    /// g + h
    f_score: u32,
    /// Tie-breaker for determinism: lower coordinates first.
    tie_breaker: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-heap behavior.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Neighbor order: up, down, left, right.
const DIRECTIONS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

#[inline]
fn coords_to_tie_breaker(pos: GridPos) -> u64 {
    (u64::from(pos.y) << 32) | u64::from(pos.x)
}

/// Find a shortest 4-connected route from `start` to `end`.
///
/// The returned list starts at `start` and ends at `end`, inclusive.
/// Intermediate tiles satisfy `traversal`; the goal tile is always
/// enterable so that enemies can path onto the structure they attack.
/// The start tile is not checked (the caller is already standing there).
///
/// Returns `None` when either end is out of bounds or no route exists.
#[must_use]
pub fn find_path(
    grid: &Grid,
    start: GridPos,
    end: GridPos,
    traversal: Traversal,
) -> Option<Vec<GridPos>> {
    if !grid.in_bounds(start) || !grid.in_bounds(end) {
        return None;
    }
    if start == end {
        return Some(vec![start]);
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut g_score: HashMap<GridPos, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        pos: start,
        f_score: start.manhattan(end),
        tie_breaker: coords_to_tie_breaker(start),
    });

    while let Some(current) = open_set.pop() {
        if current.pos == end {
            return Some(reconstruct_path(&came_from, end));
        }

        let current_g = g_score.get(&current.pos).copied().unwrap_or(u32::MAX);
        // Stale heap entry superseded by a cheaper one.
        if current.f_score > current_g.saturating_add(current.pos.manhattan(end)) {
            continue;
        }

        for &(dx, dy) in &DIRECTIONS {
            let Some(next) = current.pos.offset(dx, dy) else {
                continue;
            };
            let Some(kind) = grid.get(next) else {
                continue;
            };
            if next != end && !traversal.allows(kind) {
                continue;
            }

            let tentative_g = current_g + 1;
            if tentative_g < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current.pos);
                g_score.insert(next, tentative_g);
                open_set.push(AStarNode {
                    pos: next,
                    f_score: tentative_g + next.manhattan(end),
                    tie_breaker: coords_to_tie_breaker(next),
                });
            }
        }
    }

    None
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<GridPos, GridPos>, goal: GridPos) -> Vec<GridPos> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

/// Check that `path` is a valid 4-connected walk from `start` to `end`.
#[must_use]
pub fn is_valid_path(
    grid: &Grid,
    path: &[GridPos],
    start: GridPos,
    end: GridPos,
    traversal: Traversal,
) -> bool {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return false;
    };
    if *first != start || *last != end {
        return false;
    }
    let steps_adjacent = path.windows(2).all(|w| w[0].is_adjacent(w[1]));
    let interior_ok = path.len() <= 2
        || path[1..path.len() - 1]
            .iter()
            .all(|p| grid.get(*p).is_some_and(|k| traversal.allows(k)));
    steps_adjacent && interior_ok
}
