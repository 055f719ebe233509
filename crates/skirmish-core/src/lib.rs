//! World core for the Skirmish simulation.
//!
//! Owns all simulation state and the tick cycle that advances it:
//!
//! - [`config`] -- world configuration with documented defaults
//! - [`vote`] -- windowed spectator vote aggregation
//! - [`thinking`] -- bounded storage for reasoning artifacts
//! - [`world`] -- the [`World`]: agents, items, map, events, snapshots
//! - [`tick`] -- the 7-step tick cycle ([`tick::run_tick`])
//!
//! The concurrency contract is single-writer: one driver calls
//! [`tick::run_tick`] on a cadence; the only parallelism inside a tick
//! is the decision fan-out to the backend, which completes before any
//! result is applied.

pub mod config;
pub mod error;
pub mod thinking;
pub mod tick;
pub mod vote;
pub mod world;

pub use config::{BackendChoice, LlmConfig, ThinkingStorageChoice, WorldConfig};
pub use error::WorldError;
pub use thinking::{MAX_ENTRIES_PER_AGENT, MAX_SESSIONS, ThinkingHistoryStore};
pub use tick::run_tick;
pub use vote::{Vote, VoteManager, VoteResolution};
pub use world::World;
