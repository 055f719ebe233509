//! Tile and tile-map representation.
//!
//! The world is a fixed-size grid of tiles, each either passable or
//! blocked, with an optional traversal weight used by the pathfinder.
//! Maps are created once at world init and never resized.

use serde::{Deserialize, Serialize};
use skirmish_types::{TileKind, TileMapWire};
use ts_rs::TS;

/// Default traversal weight for a tile.
pub const DEFAULT_WEIGHT: u8 = 1;

/// Maximum traversal weight representable in the binary codec (6 bits).
pub const MAX_WEIGHT: u8 = 63;

/// One cell of the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Tile {
    /// Whether the tile can be walked on.
    pub kind: TileKind,
    /// Traversal cost for the pathfinder, 1..=63.
    pub weight: u8,
}

impl Tile {
    /// A passable tile with the default weight.
    pub const PASSABLE: Self = Self {
        kind: TileKind::Passable,
        weight: DEFAULT_WEIGHT,
    };

    /// A blocked tile.
    pub const BLOCKED: Self = Self {
        kind: TileKind::Blocked,
        weight: DEFAULT_WEIGHT,
    };

    /// A passable tile with a custom weight, clamped to 1..=63.
    pub fn weighted(weight: u8) -> Self {
        Self {
            kind: TileKind::Passable,
            weight: weight.clamp(DEFAULT_WEIGHT, MAX_WEIGHT),
        }
    }

    /// Whether an agent may stand on this tile.
    pub const fn passable(self) -> bool {
        matches!(self.kind, TileKind::Passable)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::PASSABLE
    }
}

/// A fixed-size grid of tiles.
///
/// `tiles` always holds exactly `height` rows of exactly `width` tiles;
/// `(x, y)` is in bounds iff `0 <= x < width` and `0 <= y < height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TileMap {
    width: i32,
    height: i32,
    tiles: Vec<Vec<Tile>>,
}

impl TileMap {
    /// Create a map of the given dimensions with every tile passable.
    ///
    /// Non-positive dimensions yield an empty 0x0 map.
    pub fn filled(width: i32, height: i32) -> Self {
        let w = usize::try_from(width).unwrap_or(0);
        let h = usize::try_from(height).unwrap_or(0);
        if w == 0 || h == 0 {
            return Self {
                width: 0,
                height: 0,
                tiles: Vec::new(),
            };
        }
        Self {
            width,
            height,
            tiles: vec![vec![Tile::PASSABLE; w]; h],
        }
    }

    /// Rebuild a map from raw rows.
    ///
    /// Used by the codec; callers must guarantee the row/column invariant.
    pub(crate) fn from_rows(width: i32, height: i32, tiles: Vec<Vec<Tile>>) -> Self {
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Number of columns.
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Whether `(x, y)` lies on the grid.
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// The tile at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<Tile> {
        let row = self.tiles.get(usize::try_from(y).ok()?)?;
        row.get(usize::try_from(x).ok()?).copied()
    }

    /// Replace the tile at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        let Some(yi) = usize::try_from(y).ok() else {
            return;
        };
        let Some(xi) = usize::try_from(x).ok() else {
            return;
        };
        if let Some(row) = self.tiles.get_mut(yi)
            && let Some(cell) = row.get_mut(xi)
        {
            *cell = tile;
        }
    }

    /// Whether `(x, y)` is on the grid and walkable.
    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Tile::passable)
    }

    /// Iterate all tiles row-major with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Tile)> + '_ {
        self.tiles.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, tile)| {
                (
                    i32::try_from(x).unwrap_or(i32::MAX),
                    i32::try_from(y).unwrap_or(i32::MAX),
                    *tile,
                )
            })
        })
    }

    /// Project the map into its wire form (row-major codec bytes).
    pub fn to_wire(&self) -> TileMapWire {
        TileMapWire {
            width: u32::try_from(self.width).unwrap_or(0),
            height: u32::try_from(self.height).unwrap_or(0),
            tiles: self.iter().map(|(_, _, tile)| crate::codec::tile_byte(tile)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_map_is_all_passable() {
        let map = TileMap::filled(4, 3);
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        for (x, y, tile) in map.iter() {
            assert!(tile.passable(), "tile ({x}, {y}) should be passable");
        }
    }

    #[test]
    fn bounds_checks() {
        let map = TileMap::filled(3, 3);
        assert!(map.in_bounds(0, 0));
        assert!(map.in_bounds(2, 2));
        assert!(!map.in_bounds(3, 0));
        assert!(!map.in_bounds(0, -1));
        assert!(map.get(5, 5).is_none());
        assert!(!map.is_passable(-1, 0));
    }

    #[test]
    fn set_and_get() {
        let mut map = TileMap::filled(3, 3);
        map.set(1, 2, Tile::BLOCKED);
        assert!(!map.is_passable(1, 2));
        assert!(map.is_passable(2, 1));
        // Out-of-bounds writes are silently ignored.
        map.set(9, 9, Tile::BLOCKED);
        assert_eq!(map.width(), 3);
    }

    #[test]
    fn weighted_clamps() {
        assert_eq!(Tile::weighted(0).weight, 1);
        assert_eq!(Tile::weighted(200).weight, 63);
        assert_eq!(Tile::weighted(7).weight, 7);
    }

    #[test]
    fn zero_sized_map_is_empty() {
        let map = TileMap::filled(0, 5);
        assert_eq!(map.width(), 0);
        assert_eq!(map.height(), 0);
        assert!(!map.in_bounds(0, 0));
    }
}
