//! Payloads crossing the world / decision-backend boundary.
//!
//! Each tick the world assembles one [`DecisionContext`] per living agent
//! from a consistent pre-tick snapshot, hands them to the decision backend
//! (possibly concurrently), and receives one [`Decision`] per agent back.
//! Contexts are self-contained values: the backend never touches world
//! state directly.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DecisionType, ItemKind};
use crate::ids::{AgentId, ItemId};
use crate::structs::{GridPos, ThinkingProcess};

/// A rival agent visible to the deciding agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NearbyAgent {
    /// The visible agent's identifier.
    pub id: AgentId,
    /// Display name (used for vote and LLM target matching).
    pub name: String,
    /// Current hit points.
    pub hp: i32,
    /// Hit point ceiling.
    pub max_hp: i32,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Manhattan distance from the deciding agent.
    pub distance: u32,
    /// Whether the deciding agent counts this one as an ally.
    pub is_ally: bool,
    /// Whether the deciding agent counts this one as an enemy.
    pub is_enemy: bool,
}

impl NearbyAgent {
    /// The visible agent's tile as a [`GridPos`].
    pub const fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// An item visible to the deciding agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NearbyItem {
    /// The item's identifier.
    pub id: ItemId,
    /// Weapon archetype (used for loot target matching).
    pub kind: ItemKind,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Manhattan distance from the deciding agent.
    pub distance: u32,
}

/// World-level statistics included in every decision context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldContext {
    /// Current tick number.
    pub tick: u64,
    /// Number of living agents.
    pub alive_count: u32,
    /// Current side length of the safe square.
    pub shrink_border: i32,
    /// Center of the safe zone.
    pub zone_center: GridPos,
}

/// Everything a backend may consult when deciding one agent's action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DecisionContext {
    /// The deciding agent.
    pub agent_id: AgentId,
    /// The deciding agent's name.
    pub name: String,
    /// Personality keyword (aggressive, cautious, treacherous, ...).
    pub personality: String,
    /// Current hit points.
    pub hp: i32,
    /// Hit point ceiling.
    pub max_hp: i32,
    /// Attack stat.
    pub attack: i32,
    /// Defense stat.
    pub defense: i32,
    /// Current position.
    pub pos: GridPos,
    /// Visible agents, nearest first.
    pub nearby_agents: Vec<NearbyAgent>,
    /// Visible items, nearest first.
    pub nearby_items: Vec<NearbyItem>,
    /// Recent memory texts, oldest first.
    pub recent_memories: Vec<String>,
    /// A freshly delivered spectator instruction, if one exists.
    pub inner_voice: Option<String>,
    /// World-level statistics.
    pub world: WorldContext,
}

/// Context for a periodic reflection call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReflectContext {
    /// The reflecting agent.
    pub agent_id: AgentId,
    /// The reflecting agent's name.
    pub name: String,
    /// Personality keyword.
    pub personality: String,
    /// Current hit points.
    pub hp: i32,
    /// Hit point ceiling.
    pub max_hp: i32,
    /// Recent memory texts, oldest first.
    pub recent_memories: Vec<String>,
}

/// The action a backend chose for one agent in one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Decision {
    /// The chosen action.
    pub kind: DecisionType,
    /// Target agent for Attack / Ally / Betray.
    pub target_agent: Option<AgentId>,
    /// Target item for Loot.
    pub target_item: Option<ItemId>,
    /// Why the backend chose this action.
    pub reason: Option<String>,
    /// Reasoning artifact for the thinking-history store.
    pub thinking: Option<ThinkingProcess>,
}

impl Decision {
    /// A bare decision with no target and no reasoning.
    pub const fn of(kind: DecisionType) -> Self {
        Self {
            kind,
            target_agent: None,
            target_item: None,
            reason: None,
            thinking: None,
        }
    }

    /// A decision targeting an agent.
    pub fn against(kind: DecisionType, target: AgentId, reason: impl Into<String>) -> Self {
        Self {
            kind,
            target_agent: Some(target),
            target_item: None,
            reason: Some(reason.into()),
            thinking: None,
        }
    }

    /// A loot decision targeting an item.
    pub fn loot(item: ItemId, reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionType::Loot,
            target_agent: None,
            target_item: Some(item),
            reason: Some(reason.into()),
            thinking: None,
        }
    }

    /// The same decision with a reason attached.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
