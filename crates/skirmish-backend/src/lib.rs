//! Decision backends for the Skirmish simulation.
//!
//! A backend maps a [`DecisionContext`] to a [`Decision`] and produces
//! periodic reflections. Two variants exist:
//!
//! - [`RuleBackend`] -- deterministic priority rules; the default and the
//!   universal fallback.
//! - [`LlmDecisionBackend`] -- consults a remote chat-completions API
//!   behind a counted concurrency gate and a per-call deadline, wrapping
//!   a rule backend as its fallback (composition, not inheritance).
//!
//! Dispatch is an enum rather than a trait object because async methods
//! are not dyn-compatible. Both variants are safe under concurrent calls:
//! the world may fan out one `decide` per living agent in parallel.

pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod rule;
pub mod scripted;

use skirmish_types::{Decision, DecisionContext, ReflectContext};

pub use error::BackendError;
pub use llm::{ConcurrencyGate, LlmDecisionBackend, LlmSettings};
pub use rule::RuleBackend;
pub use scripted::ScriptedBackend;

/// A decision backend, selected at startup from configuration.
pub enum DecisionBackend {
    /// Deterministic priority rules.
    Rule(RuleBackend),
    /// Remote LLM with gate, deadline, and rule fallback.
    Llm(LlmDecisionBackend),
    /// Fixed per-agent decisions (tests and drills).
    Scripted(ScriptedBackend),
}

impl DecisionBackend {
    /// Construct the rule-based variant.
    pub const fn rule_based() -> Self {
        Self::Rule(RuleBackend::new())
    }

    /// Construct the LLM variant.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Template`] if the embedded prompt
    /// templates fail to parse.
    pub fn llm(settings: LlmSettings) -> Result<Self, BackendError> {
        Ok(Self::Llm(LlmDecisionBackend::new(settings)?))
    }

    /// Decide one agent's action. Never fails; the LLM variant resolves
    /// every failure to its rule fallback internally.
    pub async fn decide(&self, ctx: &DecisionContext) -> Decision {
        match self {
            Self::Rule(backend) => backend.decide(ctx),
            Self::Llm(backend) => backend.decide(ctx).await,
            Self::Scripted(backend) => backend.decide(ctx),
        }
    }

    /// Produce a reflection over recent memories, or `None` when nothing
    /// stands out.
    pub async fn reflect(&self, ctx: &ReflectContext) -> Option<String> {
        match self {
            Self::Rule(backend) => backend.reflect(ctx),
            Self::Llm(backend) => backend.reflect(ctx).await,
            Self::Scripted(backend) => backend.reflect(ctx),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rule(_) => "rule-based",
            Self::Llm(_) => "llm",
            Self::Scripted(_) => "scripted",
        }
    }
}
