//! Binary tile-map codec.
//!
//! Layout (little-endian):
//!
//! ```text
//! u32 width | u32 height | width*height tile bytes, row-major (y outer)
//! ```
//!
//! Each tile byte packs the kind in bits 0-1 (0 = passable, 1 = blocked)
//! and the weight in bits 2-7 (0 means "default weight"). The format is
//! used both inside `sync.full` payloads and for `.map` file artifacts.

use skirmish_types::TileKind;

use crate::error::CodecError;
use crate::tile::{DEFAULT_WEIGHT, MAX_WEIGHT, Tile, TileMap};

/// Size of the width/height header in bytes.
const HEADER_LEN: usize = 8;

/// Bit mask for the tile kind.
const KIND_MASK: u8 = 0b0000_0011;

/// Shift for the weight bits.
const WEIGHT_SHIFT: u8 = 2;

/// Pack one tile into its byte form.
pub(crate) fn tile_byte(tile: Tile) -> u8 {
    let kind_bits = match tile.kind {
        TileKind::Passable => 0,
        TileKind::Blocked => 1,
    };
    let weight = tile.weight.min(MAX_WEIGHT);
    kind_bits | (weight << WEIGHT_SHIFT)
}

/// Unpack one tile from its byte form.
///
/// A stored weight of 0 normalizes to the default weight.
fn byte_tile(byte: u8) -> Tile {
    let kind = if byte & KIND_MASK == 0 {
        TileKind::Passable
    } else {
        TileKind::Blocked
    };
    let raw_weight = byte >> WEIGHT_SHIFT;
    Tile {
        kind,
        weight: if raw_weight == 0 { DEFAULT_WEIGHT } else { raw_weight },
    }
}

/// Serialize a map into its binary form.
pub fn serialize(map: &TileMap) -> Vec<u8> {
    let width = u32::try_from(map.width()).unwrap_or(0);
    let height = u32::try_from(map.height()).unwrap_or(0);
    let tile_count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);

    let mut out = Vec::with_capacity(HEADER_LEN.saturating_add(tile_count));
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend(map.iter().map(|(_, _, tile)| tile_byte(tile)));
    out
}

/// Deserialize a map from its binary form.
///
/// # Errors
///
/// - [`CodecError::Truncated`] when the buffer cannot hold the header.
/// - [`CodecError::InvalidDimensions`] when either dimension is zero or
///   does not fit the grid's signed coordinate space.
/// - [`CodecError::LengthMismatch`] when the payload is shorter or longer
///   than `8 + width * height`.
pub fn deserialize(data: &[u8]) -> Result<TileMap, CodecError> {
    if data.len() < HEADER_LEN {
        return Err(CodecError::Truncated { len: data.len() });
    }

    let width = read_u32(data, 0);
    let height = read_u32(data, 4);

    if width == 0
        || height == 0
        || i32::try_from(width).is_err()
        || i32::try_from(height).is_err()
    {
        return Err(CodecError::InvalidDimensions { width, height });
    }

    let tile_count = u64::from(width) * u64::from(height);
    let expected = u64::try_from(HEADER_LEN)
        .unwrap_or(u64::MAX)
        .saturating_add(tile_count);
    let actual = u64::try_from(data.len()).unwrap_or(u64::MAX);
    if expected != actual {
        return Err(CodecError::LengthMismatch {
            expected: usize::try_from(expected).unwrap_or(usize::MAX),
            actual: data.len(),
        });
    }

    let w = usize::try_from(width).unwrap_or(0);
    let payload = data.get(HEADER_LEN..).unwrap_or_default();
    let tiles: Vec<Vec<Tile>> = payload
        .chunks(w)
        .map(|row| row.iter().map(|&b| byte_tile(b)).collect())
        .collect();

    Ok(TileMap::from_rows(
        i32::try_from(width).unwrap_or(0),
        i32::try_from(height).unwrap_or(0),
        tiles,
    ))
}

/// Read a little-endian `u32` at `offset`; missing bytes read as zero.
fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0_u8; 4];
    if let Some(slice) = data.get(offset..offset.saturating_add(4)) {
        bytes.copy_from_slice(slice);
    }
    u32::from_le_bytes(bytes)
}
