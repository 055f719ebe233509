//! Error types for the world core.

/// Errors that can occur while initializing or ticking a world.
///
/// Everything recoverable is handled locally inside the tick (fallback
/// movement, skipped item spawns, rule-based decisions); what surfaces
/// here is configuration problems and broken invariants, both of which
/// must halt the simulation rather than let it run corrupted.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An agent could not be placed on a passable tile.
    ///
    /// Raised during `init` after exhausting the placement retry budget;
    /// the map is too crowded for the configured agent count.
    #[error("could not place agent {index} after {attempts} attempts; map too crowded")]
    SpawnFailed {
        /// Zero-based index of the agent that failed to place.
        index: u32,
        /// Placement attempts made before giving up.
        attempts: u32,
    },

    /// A universal invariant no longer holds.
    ///
    /// The simulation is corrupted and must halt.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// World state could not be serialized for a snapshot.
    #[error("snapshot serialization failed: {0}")]
    Snapshot(String),
}
