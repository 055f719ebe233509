//! Wire protocol between the publisher and its subscribers.
//!
//! Messages are JSON over a bidirectional session (`WebSocket` in the
//! server). Every outbound message that describes per-tick state carries
//! the tick it belongs to; subscribers observe ticks in monotonically
//! increasing order. Inbound messages are spectator intents; malformed
//! ones are ignored by the publisher and never reach world state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::AgentId;
use crate::structs::{
    AgentDelta, AgentSnapshot, GameEvent, GridPos, Item, ThinkingProcess, TileMapWire,
    VoteStateView, WorldStateView,
};

/// Agent payload of a `sync.agents` message: the full list or a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "mode", content = "agents")]
#[ts(export, export_to = "bindings/")]
pub enum AgentUpdate {
    /// Every agent, in full form.
    Full(Vec<AgentSnapshot>),
    /// Only agents whose fingerprint changed since the previous tick.
    Delta(Vec<AgentDelta>),
}

/// A message pushed from the server to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Complete world snapshot, sent on connect and on explicit resync.
    #[serde(rename = "sync.full")]
    SyncFull {
        /// Tick the snapshot was taken at.
        tick: u64,
        /// World summary.
        world: WorldStateView,
        /// All agents in full form.
        agents: Vec<AgentSnapshot>,
        /// All items currently on the map.
        items: Vec<Item>,
        /// Current voting window state.
        votes: VoteStateView,
        /// Up to the last 20 events.
        events: Vec<GameEvent>,
        /// The tile map in structured binary form.
        tile_map: TileMapWire,
    },
    /// Per-tick world summary.
    #[serde(rename = "sync.world")]
    SyncWorld {
        /// World summary for this tick.
        world: WorldStateView,
    },
    /// Per-tick agent list (full or delta, by publisher mode).
    #[serde(rename = "sync.agents")]
    SyncAgents {
        /// Tick these updates belong to.
        tick: u64,
        /// The agent payload.
        update: AgentUpdate,
    },
    /// Events that occurred this tick; only sent when non-empty.
    #[serde(rename = "sync.events")]
    SyncEvents {
        /// Tick the events belong to.
        tick: u64,
        /// Events in occurrence order.
        events: Vec<GameEvent>,
    },
    /// Current pathfinding routes; sent every tick (possibly empty) so
    /// clients can clear stale paths.
    #[serde(rename = "sync.paths")]
    SyncPaths {
        /// Tick the paths belong to.
        tick: u64,
        /// Waypoint lists per pathfinding agent.
        paths: BTreeMap<AgentId, Vec<GridPos>>,
    },
    /// Current voting window state.
    #[serde(rename = "vote.state")]
    VoteState {
        /// Tick the state was sampled at.
        tick: u64,
        /// The ballot ranking.
        state: VoteStateView,
    },
    /// Full detail for one agent (inspect reply or follower push).
    #[serde(rename = "agent.detail")]
    AgentDetail {
        /// Tick the detail was sampled at.
        tick: u64,
        /// The agent in full form.
        agent: AgentSnapshot,
    },
    /// Reply to a thinking-history request.
    #[serde(rename = "thinking.history")]
    ThinkingHistory {
        /// The agent whose history was requested.
        agent_id: AgentId,
        /// Reasoning artifacts, newest first.
        entries: Vec<ThinkingProcess>,
    },
}

/// A message sent by a subscriber to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Cast (or replace) this player's vote for an agent's next action.
    #[serde(rename = "vote.submit")]
    VoteSubmit {
        /// The agent being voted on.
        agent_id: AgentId,
        /// The suggested action text, e.g. `"attack Vex"`.
        action: String,
    },
    /// Request a one-off full-detail reply for an agent.
    #[serde(rename = "agent.inspect")]
    AgentInspect {
        /// The agent to inspect.
        agent_id: AgentId,
    },
    /// Follow an agent (or stop following with `None`).
    #[serde(rename = "agent.follow")]
    AgentFollow {
        /// The agent to follow; `null` clears the follow.
        agent_id: Option<AgentId>,
    },
    /// Request recent reasoning artifacts for an agent.
    #[serde(rename = "thinking.request")]
    ThinkingRequest {
        /// The agent whose history is requested.
        agent_id: AgentId,
        /// Maximum entries to return (server default when absent).
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_tags() {
        let msg = ServerMessage::SyncWorld {
            world: WorldStateView {
                tick: 3,
                alive_count: 5,
                shrink_border: 20,
                phase: crate::enums::GamePhase::Running,
                zone_center: GridPos::new(10, 10),
            },
        };
        let json = serde_json::to_string(&msg).unwrap_or_default();
        assert!(json.contains("\"type\":\"sync.world\""));
    }

    #[test]
    fn client_message_roundtrip() {
        let raw = r#"{"type":"agent.follow","agent_id":null}"#;
        let parsed: Result<ClientMessage, _> = serde_json::from_str(raw);
        assert_eq!(parsed.ok(), Some(ClientMessage::AgentFollow { agent_id: None }));
    }

    #[test]
    fn vote_submit_parses() {
        let id = AgentId::new();
        let raw = format!(r#"{{"type":"vote.submit","agent_id":"{id}","action":"flee"}}"#);
        let parsed: Result<ClientMessage, _> = serde_json::from_str(&raw);
        assert_eq!(
            parsed.ok(),
            Some(ClientMessage::VoteSubmit {
                agent_id: id,
                action: String::from("flee"),
            })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let raw = r#"{"type":"world.mutate","agent_id":null}"#;
        let parsed: Result<ClientMessage, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn agent_update_modes_are_tagged() {
        let update = AgentUpdate::Delta(Vec::new());
        let json = serde_json::to_string(&update).unwrap_or_default();
        assert!(json.contains("\"mode\":\"Delta\""));
    }
}
