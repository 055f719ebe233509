//! The tick driver: the world's single writer.
//!
//! One task owns the cadence. Each cycle it drains queued spectator
//! intents into the world, runs one tick, and broadcasts the per-tick
//! message batch in a fixed order: world summary, agent updates (full or
//! delta), events (when any), vote state, paths (always, so stale routes
//! clear client-side), then follower detail pushes for agents that
//! changed. Because all frames flow through one broadcast sender, every
//! subscriber observes ticks in order.

use skirmish_backend::DecisionBackend;
use skirmish_core::{WorldError, run_tick};
use skirmish_types::{AgentUpdate, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::state::{AppState, Intent, Scope};

/// How agent updates are broadcast each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentSyncMode {
    /// Only agents whose fingerprint changed (the default).
    #[default]
    Delta,
    /// The full agent list every tick.
    Full,
}

/// Run the tick loop until the world reports a fatal error.
///
/// # Errors
///
/// Propagates [`WorldError::InvariantViolation`]; a corrupted world
/// halts rather than continuing to broadcast garbage.
pub async fn run_driver(
    state: AppState,
    backend: DecisionBackend,
    mut intents: mpsc::Receiver<Intent>,
    sync_mode: AgentSyncMode,
) -> Result<(), WorldError> {
    let tick_interval = {
        let world = state.world.read().await;
        world.config.tick_interval()
    };
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        interval_ms = u64::try_from(tick_interval.as_millis()).unwrap_or(u64::MAX),
        backend = backend.name(),
        "tick driver started"
    );

    loop {
        ticker.tick().await;

        let mut world = state.world.write().await;

        // Apply queued spectator intents before the tick so a vote cast
        // during window W is counted in W.
        while let Ok(intent) = intents.try_recv() {
            match intent {
                Intent::VoteSubmit(vote) => world.votes.submit(vote),
            }
        }

        let events = match run_tick(&mut world, &backend).await {
            Ok(events) => events,
            Err(err) => {
                error!(error = %err, "tick failed, halting driver");
                return Err(err);
            }
        };

        let tick = world.tick;
        let world_view = world.world_state();
        let deltas = world.agent_deltas();
        let update = match sync_mode {
            AgentSyncMode::Full => AgentUpdate::Full(world.agent_snapshots()),
            AgentSyncMode::Delta => AgentUpdate::Delta(deltas.clone()),
        };
        let vote_state = world.votes.state();
        let paths = world.agent_paths.clone();
        let follower_details: Vec<_> = deltas
            .iter()
            .filter_map(|delta| {
                world
                    .agents
                    .get(&delta.id)
                    .map(|agent| (delta.id, agent.snapshot()))
            })
            .collect();
        drop(world);

        state.broadcast(Scope::All, &ServerMessage::SyncWorld { world: world_view });
        state.broadcast(Scope::All, &ServerMessage::SyncAgents { tick, update });
        if !events.is_empty() {
            state.broadcast(Scope::All, &ServerMessage::SyncEvents { tick, events });
        }
        state.broadcast(Scope::All, &ServerMessage::VoteState { tick, state: vote_state });
        state.broadcast(Scope::All, &ServerMessage::SyncPaths { tick, paths });
        for (agent_id, agent) in follower_details {
            state.broadcast(
                Scope::Followers(agent_id),
                &ServerMessage::AgentDetail { tick, agent },
            );
        }

        debug!(tick, "tick broadcast complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sync_mode_is_delta() {
        assert_eq!(AgentSyncMode::default(), AgentSyncMode::Delta);
    }
}
