//! Core entity structs shared across the Skirmish workspace.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionState, EventKind, GamePhase, ItemKind, MemoryKind};
use crate::ids::{AgentId, ItemId};

// ---------------------------------------------------------------------------
// Grid positions
// ---------------------------------------------------------------------------

/// An integer grid coordinate.
///
/// Used for agent positions, waypoints, and the zone center.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct GridPos {
    /// Column, 0-based from the west edge.
    pub x: i32,
    /// Row, 0-based from the north edge.
    pub y: i32,
}

impl GridPos {
    /// Create a position from raw coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Whether another position is 4-adjacent (distance exactly 1).
    pub const fn adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }
}

impl core::fmt::Display for GridPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Memories
// ---------------------------------------------------------------------------

/// Lowest storable importance.
pub const MEMORY_IMPORTANCE_MIN: u8 = 1;

/// Highest storable importance.
pub const MEMORY_IMPORTANCE_MAX: u8 = 10;

/// A single memory held by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MemoryEntry {
    /// Human-readable description of what happened.
    pub text: String,
    /// Category of the memory.
    pub kind: MemoryKind,
    /// Retention importance, clamped to 1..=10.
    pub importance: u8,
    /// Wall-clock moment the memory was formed.
    pub timestamp: DateTime<Utc>,
}

impl MemoryEntry {
    /// Create a memory stamped with the current wall-clock time.
    ///
    /// `importance` is clamped to the 1..=10 range.
    pub fn new(text: impl Into<String>, importance: u8, kind: MemoryKind) -> Self {
        Self {
            text: text.into(),
            kind,
            importance: importance.clamp(MEMORY_IMPORTANCE_MIN, MEMORY_IMPORTANCE_MAX),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A lootable item lying on a passable tile.
///
/// Exists from spawn until an agent picks it up; looting grants the bonus
/// as an attack increase and equips the weapon kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Item {
    /// Strictly increasing identifier within a world lifetime.
    pub id: ItemId,
    /// Column of the tile the item lies on.
    pub x: i32,
    /// Row of the tile the item lies on.
    pub y: i32,
    /// Weapon archetype.
    pub kind: ItemKind,
    /// Attack bonus granted on pickup.
    pub bonus: i32,
}

impl Item {
    /// The item's tile as a [`GridPos`].
    pub const fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An observable event that happened during a tick.
///
/// Events are appended in occurrence order within a tick, drained and
/// published once, and never mutated after emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameEvent {
    /// What kind of thing happened.
    pub kind: EventKind,
    /// Tick during which the event occurred.
    pub tick: u64,
    /// Spectator-facing description.
    pub message: String,
    /// Agents involved, in role order (e.g. attacker before victim).
    pub agent_ids: Vec<AgentId>,
    /// Wall-clock moment of emission.
    pub timestamp: DateTime<Utc>,
}

impl GameEvent {
    /// Create an event stamped with the current wall-clock time.
    pub fn new(
        kind: EventKind,
        tick: u64,
        message: impl Into<String>,
        agent_ids: Vec<AgentId>,
    ) -> Self {
        Self {
            kind,
            tick,
            message: message.into(),
            agent_ids,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Thinking artifacts
// ---------------------------------------------------------------------------

/// One reasoning artifact produced by the decision backend for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ThinkingProcess {
    /// The action that was decided, in display form.
    pub action: String,
    /// Why the backend chose it.
    pub reasoning: String,
    /// The rendered prompt, when an LLM was consulted.
    pub prompt: Option<String>,
    /// The raw LLM response, when one was received.
    pub raw_response: Option<String>,
    /// Wall-clock moment the decision completed.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Agent projections
// ---------------------------------------------------------------------------

/// Full agent state as published to spectators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentSnapshot {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Personality keyword driving rule-based behavior.
    pub personality: String,
    /// Flavor description.
    pub description: String,
    /// Current hit points.
    pub hp: i32,
    /// Hit point ceiling.
    pub max_hp: i32,
    /// Attack stat (base plus looted bonuses).
    pub attack: i32,
    /// Defense stat.
    pub defense: i32,
    /// Equipped weapon, if any item has been looted.
    pub weapon: Option<ItemKind>,
    /// Number of kills credited.
    pub kill_count: u32,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Whether the agent is still in the game.
    pub alive: bool,
    /// Current activity tag.
    pub action_state: ActionState,
    /// Allied agent IDs.
    pub alliances: Vec<AgentId>,
    /// Hostile agent IDs.
    pub enemies: Vec<AgentId>,
    /// Free-text description of the current action.
    pub current_action: String,
    /// Latest reasoning artifact, if any.
    pub thinking: Option<ThinkingProcess>,
}

/// Minimal per-agent update used in delta broadcast mode.
///
/// Carries exactly the fingerprint fields that decide whether an agent
/// changed between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentDelta {
    /// Agent identifier.
    pub id: AgentId,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Current hit points.
    pub hp: i32,
    /// Whether the agent is still in the game.
    pub alive: bool,
    /// Current activity tag.
    pub action_state: ActionState,
}

// ---------------------------------------------------------------------------
// World projections
// ---------------------------------------------------------------------------

/// Lightweight per-tick world summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldStateView {
    /// Current tick number.
    pub tick: u64,
    /// Number of living agents.
    pub alive_count: u32,
    /// Current side length of the safe square.
    pub shrink_border: i32,
    /// Lifecycle phase.
    pub phase: GamePhase,
    /// Center of the safe zone.
    pub zone_center: GridPos,
}

/// One (action, tally) pair in a vote ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionCount {
    /// The voted action text.
    pub action: String,
    /// Number of players currently voting for it.
    pub count: u32,
}

/// Published view of the current voting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VoteStateView {
    /// Identifier of the open window.
    pub window_id: u64,
    /// Milliseconds until the window resolves.
    pub time_remaining_ms: u64,
    /// Ranked (action, count) pairs per agent, descending by count.
    pub agent_votes: BTreeMap<AgentId, Vec<ActionCount>>,
}

/// Structured tile-map payload embedded in a full sync.
///
/// `tiles` holds one byte per tile in row-major order using the binary
/// codec's per-tile layout (bits 0-1 kind, bits 2-7 weight, 0 = default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TileMapWire {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Row-major per-tile bytes.
    pub tiles: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance() {
        let a = GridPos::new(0, 0);
        let b = GridPos::new(3, 4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(b.manhattan(a), 7);
        assert!(GridPos::new(1, 0).adjacent(a));
        assert!(!b.adjacent(a));
    }

    #[test]
    fn memory_entry_clamps_importance() {
        let low = MemoryEntry::new("saw nothing", 0, MemoryKind::Observation);
        assert_eq!(low.importance, 1);
        let high = MemoryEntry::new("won the game", 42, MemoryKind::Observation);
        assert_eq!(high.importance, 10);
        let mid = MemoryEntry::new("found a sword", 6, MemoryKind::Observation);
        assert_eq!(mid.importance, 6);
    }

    #[test]
    fn event_carries_tick_and_agents() {
        let id = AgentId::new();
        let event = GameEvent::new(EventKind::Kill, 9, "X fell", vec![id]);
        assert_eq!(event.tick, 9);
        assert_eq!(event.agent_ids, vec![id]);
    }

    #[test]
    fn item_pos_matches_fields() {
        let item = Item {
            id: ItemId(1),
            x: 4,
            y: 2,
            kind: ItemKind::Axe,
            bonus: 5,
        };
        assert_eq!(item.pos(), GridPos::new(4, 2));
    }
}
