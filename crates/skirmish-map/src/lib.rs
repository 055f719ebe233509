//! Tile grid, map generation, binary codec, and A* pathfinding.
//!
//! The map is the static geometry of a Skirmish world: a fixed grid of
//! passable and blocked tiles created once at world init. This crate owns
//!
//! - [`tile`] -- the [`Tile`] / [`TileMap`] representation,
//! - [`mapgen`] -- obstacle placement (seeded-LCG random scatter, border
//!   walls, clipped rectangles),
//! - [`codec`] -- the compact binary map format used on the wire and for
//!   `.map` artifacts,
//! - [`path`] -- A* pathfinding with per-tile costs.

pub mod codec;
pub mod error;
pub mod mapgen;
pub mod path;
pub mod tile;

pub use error::CodecError;
pub use path::{Path, find_path};
pub use tile::{DEFAULT_WEIGHT, MAX_WEIGHT, Tile, TileMap};
