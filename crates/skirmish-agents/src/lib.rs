//! Agent entities for the Skirmish simulation.
//!
//! This crate owns everything that is "one combatant":
//!
//! - [`template`] -- the built-in roster and per-instance stat jitter
//! - [`memory`] -- the bounded, scored memory stream
//! - [`agent`] -- the entity itself: stats, relationships, perception,
//!   direct and waypoint movement, damage, and inner-voice delivery
//!
//! Agents never mutate each other or the world; the world drives them
//! from the tick loop and is the single writer.

pub mod agent;
pub mod memory;
pub mod template;

pub use agent::{Agent, INNER_VOICE_WINDOW_SECS};
pub use memory::{MAX_MEMORIES, MemoryStream, RECENCY_DECAY, keyword_relevance};
pub use template::{AgentTemplate, BaseStats, ROSTER, roster_template};
