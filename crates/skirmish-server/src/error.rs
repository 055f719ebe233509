//! Error types for the server binary.

use skirmish_core::WorldError;

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// World initialization or a fatal tick failure.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The decision backend could not be constructed.
    #[error("backend error: {source}")]
    Backend {
        /// The underlying backend error.
        #[from]
        source: skirmish_backend::BackendError,
    },

    /// The listen socket could not be bound.
    #[error("bind failed: {source}")]
    Bind {
        /// The underlying IO error.
        #[from]
        source: std::io::Error,
    },
}
