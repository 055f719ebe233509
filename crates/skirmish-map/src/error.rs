//! Error types for map serialization.

/// Errors produced when decoding a binary tile map.
///
/// A failed decode never partially constructs a [`crate::TileMap`]; the
/// buffer is rejected outright.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer is too short to hold the 8-byte header.
    #[error("buffer too short for header: {len} bytes")]
    Truncated {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// The header declares a zero-sized or oversized map.
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// The payload length does not match `8 + width * height`.
    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Expected total buffer length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },
}
