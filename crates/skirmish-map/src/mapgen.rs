//! Map generation: obstacle placement and terrain helpers.
//!
//! Obstacle placement is driven by a small linear congruential generator
//! so that a supplied seed reproduces the exact same map. When no seed is
//! given, the initial generator state is drawn from the process RNG.

use rand::Rng;
use tracing::debug;

use crate::tile::{Tile, TileMap};

/// LCG multiplier.
const LCG_MUL: u64 = 9301;

/// LCG increment.
const LCG_INC: u64 = 49297;

/// LCG modulus.
const LCG_MOD: u64 = 233_280;

/// Deterministic pseudo-random sequence for map generation.
///
/// Classic `(s * 9301 + 49297) mod 233280` generator; each step yields a
/// value in `[0, 1)`. Good enough for obstacle scattering, and cheap to
/// reproduce from a seed.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a generator from an explicit seed.
    pub const fn new(seed: u64) -> Self {
        Self { state: seed % LCG_MOD }
    }

    /// Create a generator seeded from the process RNG.
    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random::<u64>())
    }

    /// Advance the generator and return the next value in `[0, 1)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC)) % LCG_MOD;
        self.state as f64 / LCG_MOD as f64
    }
}

/// Create a map of the given dimensions with every tile passable.
pub fn create_empty(width: i32, height: i32) -> TileMap {
    TileMap::filled(width, height)
}

/// Independently mark each tile blocked with probability `density`.
///
/// `density` is clamped to `[0, 1]`. With `seed = Some(s)` the same map is
/// produced every time; with `None` the obstacle layout is random.
pub fn add_random_obstacles(map: &mut TileMap, density: f64, seed: Option<u64>) {
    let density = density.clamp(0.0, 1.0);
    let mut lcg = seed.map_or_else(Lcg::from_entropy, Lcg::new);

    let mut blocked = 0_u32;
    for y in 0..map.height() {
        for x in 0..map.width() {
            if lcg.next_f64() < density {
                map.set(x, y, Tile::BLOCKED);
                blocked = blocked.saturating_add(1);
            }
        }
    }
    debug!(
        width = map.width(),
        height = map.height(),
        density,
        blocked,
        "obstacles placed"
    );
}

/// Block every tile on the outer edge of the map.
pub fn add_border_walls(map: &mut TileMap) {
    let (w, h) = (map.width(), map.height());
    for x in 0..w {
        map.set(x, 0, Tile::BLOCKED);
        map.set(x, h.saturating_sub(1), Tile::BLOCKED);
    }
    for y in 0..h {
        map.set(0, y, Tile::BLOCKED);
        map.set(w.saturating_sub(1), y, Tile::BLOCKED);
    }
}

/// Block a rectangle of tiles, clipped to the map bounds.
pub fn add_rectangle(map: &mut TileMap, x: i32, y: i32, width: i32, height: i32) {
    let x_end = x.saturating_add(width);
    let y_end = y.saturating_add(height);
    for ty in y.max(0)..y_end.min(map.height()) {
        for tx in x.max(0)..x_end.min(map.width()) {
            map.set(tx, ty, Tile::BLOCKED);
        }
    }
}
