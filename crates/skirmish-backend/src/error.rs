//! Error types for the decision backend.
//!
//! These errors are internal to the crate: `decide` and `reflect` never
//! surface them. Any failure along the LLM path resolves to the rule-based
//! fallback, so a broken or slow remote manifests as rule-quality play,
//! not as a hang or a crash.

/// Errors that can occur inside the LLM decision path.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// A prompt template failed to load or render.
    #[error("template error: {0}")]
    Template(String),

    /// The HTTP call failed or returned a non-success status.
    #[error("llm request failed: {0}")]
    Http(String),

    /// The response text could not be parsed into a decision.
    #[error("llm response unparseable: {0}")]
    Parse(String),

    /// The per-call deadline elapsed before the remote answered.
    #[error("llm call exceeded its deadline")]
    Deadline,

    /// The concurrency gate was closed (backend shutting down).
    #[error("concurrency gate closed")]
    GateClosed,
}
