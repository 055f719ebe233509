//! A* pathfinding over the tile grid.
//!
//! The search runs on the 4-connected grid with a Manhattan-distance
//! heuristic. The cost of a step is the weight of the destination tile
//! (default 1), so the heuristic stays admissible for any weights >= 1.
//! All arithmetic is integer.
//!
//! Determinism: heap entries carry a monotone insertion counter as the
//! final tie-break, so identical inputs always produce identical paths.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use serde::{Deserialize, Serialize};
use skirmish_types::GridPos;
use ts_rs::TS;

use crate::tile::TileMap;

/// Neighbor offsets, explored in this fixed order.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A route across the grid.
///
/// `waypoints[0]` is the start, the last waypoint is the goal, every
/// consecutive pair is 4-adjacent, and every waypoint is passable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Path {
    /// The route, start first.
    pub waypoints: Vec<GridPos>,
    /// Total traversal cost (sum of destination tile weights).
    pub cost: u32,
}

/// Find the cheapest 4-connected path from `start` to `goal`.
///
/// Returns `None` when either endpoint is out of bounds or blocked, or
/// when no passable route exists. When `start == goal` the trivial
/// zero-cost path is returned; note that this branch does not check the
/// tile's passability (callers that care validate the endpoint first).
pub fn find_path(map: &TileMap, start: GridPos, goal: GridPos) -> Option<Path> {
    if start == goal {
        return Some(Path {
            waypoints: vec![start],
            cost: 0,
        });
    }

    if !map.is_passable(start.x, start.y) || !map.is_passable(goal.x, goal.y) {
        return None;
    }

    // Min-heap ordered by (f, h, insertion order): Reverse flips the max-heap.
    let mut open: BinaryHeap<Reverse<(u32, u32, u64, GridPos)>> = BinaryHeap::new();
    let mut g_score: BTreeMap<GridPos, u32> = BTreeMap::new();
    let mut came_from: BTreeMap<GridPos, GridPos> = BTreeMap::new();
    let mut closed: BTreeSet<GridPos> = BTreeSet::new();
    let mut seq: u64 = 0;

    let h0 = start.manhattan(goal);
    g_score.insert(start, 0);
    open.push(Reverse((h0, h0, seq, start)));

    while let Some(Reverse((_, _, _, current))) = open.pop() {
        if current == goal {
            return Some(reconstruct(&came_from, goal, &g_score));
        }
        if !closed.insert(current) {
            continue;
        }

        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let next = GridPos::new(current.x.saturating_add(dx), current.y.saturating_add(dy));
            if closed.contains(&next) {
                continue;
            }
            let Some(tile) = map.get(next.x, next.y) else {
                continue;
            };
            if !tile.passable() {
                continue;
            }

            let tentative = current_g.saturating_add(u32::from(tile.weight));
            if tentative < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                g_score.insert(next, tentative);
                came_from.insert(next, current);
                let h = next.manhattan(goal);
                seq = seq.wrapping_add(1);
                open.push(Reverse((tentative.saturating_add(h), h, seq, next)));
            }
        }
    }

    None
}

/// Walk the `came_from` chain back from the goal and build the path.
fn reconstruct(
    came_from: &BTreeMap<GridPos, GridPos>,
    goal: GridPos,
    g_score: &BTreeMap<GridPos, u32>,
) -> Path {
    let mut waypoints = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        waypoints.push(prev);
        current = prev;
    }
    waypoints.reverse();
    Path {
        waypoints,
        cost: g_score.get(&goal).copied().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen;
    use crate::tile::Tile;

    fn open_map(size: i32) -> TileMap {
        mapgen::create_empty(size, size)
    }

    #[test]
    fn start_equals_goal_is_trivial() {
        let map = open_map(3);
        let p = GridPos::new(1, 1);
        let path = find_path(&map, p, p);
        assert_eq!(
            path,
            Some(Path {
                waypoints: vec![p],
                cost: 0
            })
        );
    }

    #[test]
    fn trivial_path_skips_passability_check() {
        // Matches the behavior callers rely on: a degenerate request for
        // the tile you already stand on succeeds even if that tile is
        // marked blocked.
        let mut map = open_map(3);
        map.set(1, 1, Tile::BLOCKED);
        let p = GridPos::new(1, 1);
        assert!(find_path(&map, p, p).is_some());
    }

    #[test]
    fn straight_line_has_manhattan_cost() {
        let map = open_map(5);
        let path = find_path(&map, GridPos::new(0, 0), GridPos::new(4, 0));
        let path = path.unwrap_or(Path {
            waypoints: Vec::new(),
            cost: 0,
        });
        assert_eq!(path.cost, 4);
        assert_eq!(path.waypoints.len(), 5);
        assert_eq!(path.waypoints.first(), Some(&GridPos::new(0, 0)));
        assert_eq!(path.waypoints.last(), Some(&GridPos::new(4, 0)));
    }

    #[test]
    fn path_steps_are_adjacent_and_passable() {
        let mut map = open_map(6);
        mapgen::add_rectangle(&mut map, 2, 0, 1, 4);
        let path = find_path(&map, GridPos::new(0, 0), GridPos::new(5, 0));
        let path = path.unwrap_or(Path {
            waypoints: Vec::new(),
            cost: 0,
        });
        assert!(!path.waypoints.is_empty());
        for pair in path.waypoints.windows(2) {
            if let [a, b] = pair {
                assert!(a.adjacent(*b), "{a} and {b} are not adjacent");
            }
        }
        for wp in &path.waypoints {
            assert!(map.is_passable(wp.x, wp.y), "{wp} is not passable");
        }
    }

    #[test]
    fn detour_cost_is_manhattan_plus_double_detour_steps() {
        // A wall at column 2 spanning rows 0..=3 forces the path down to
        // row 4 and back: 4 detour steps each way on a 5-wide map.
        let mut map = open_map(5);
        mapgen::add_rectangle(&mut map, 2, 0, 1, 4);
        let path = find_path(&map, GridPos::new(0, 0), GridPos::new(4, 0));
        let path = path.unwrap_or(Path {
            waypoints: Vec::new(),
            cost: 0,
        });
        // Manhattan distance 4, detour of 4 rows down and 4 back up.
        assert_eq!(path.cost, 12);
        assert!(path.waypoints.contains(&GridPos::new(2, 4)));
    }

    #[test]
    fn blocked_goal_yields_none() {
        let mut map = open_map(4);
        map.set(3, 3, Tile::BLOCKED);
        assert!(find_path(&map, GridPos::new(0, 0), GridPos::new(3, 3)).is_none());
    }

    #[test]
    fn out_of_bounds_yields_none() {
        let map = open_map(4);
        assert!(find_path(&map, GridPos::new(0, 0), GridPos::new(9, 0)).is_none());
        assert!(find_path(&map, GridPos::new(-1, 0), GridPos::new(2, 2)).is_none());
    }

    #[test]
    fn sealed_region_yields_none() {
        let mut map = open_map(5);
        // Wall off the right edge completely.
        mapgen::add_rectangle(&mut map, 3, 0, 1, 5);
        assert!(find_path(&map, GridPos::new(0, 0), GridPos::new(4, 4)).is_none());
    }

    #[test]
    fn heavy_tiles_are_avoided_when_cheaper_detour_exists() {
        // A swamp tile of weight 5 on the straight route; going around
        // costs 4 instead of 1 + 5.
        let mut map = open_map(3);
        map.set(1, 0, Tile::weighted(5));
        let path = find_path(&map, GridPos::new(0, 0), GridPos::new(2, 0));
        let path = path.unwrap_or(Path {
            waypoints: Vec::new(),
            cost: 0,
        });
        assert_eq!(path.cost, 4);
        assert!(!path.waypoints.contains(&GridPos::new(1, 0)));
    }

    #[test]
    fn identical_inputs_produce_identical_paths() {
        let mut map = open_map(8);
        mapgen::add_random_obstacles(&mut map, 0.2, Some(5));
        let a = find_path(&map, GridPos::new(0, 0), GridPos::new(7, 7));
        let b = find_path(&map, GridPos::new(0, 0), GridPos::new(7, 7));
        assert_eq!(a, b);
    }
}
