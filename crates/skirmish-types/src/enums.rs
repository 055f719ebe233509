//! Enumeration types for the Skirmish simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

/// Whether a tile can be walked on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TileKind {
    /// Agents and items may occupy this tile.
    #[default]
    Passable,
    /// Impassable terrain; never occupied, never on a path.
    Blocked,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Coarse activity tag describing what an agent is currently doing.
///
/// Broadcast to spectators for rendering; `Dead` is entered exactly when
/// hit points reach zero and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActionState {
    /// No current activity.
    Idle,
    /// Wandering the map.
    Exploring,
    /// Engaged in combat.
    Fighting,
    /// Retreating from nearby threats.
    Fleeing,
    /// Moving toward or picking up an item.
    Looting,
    /// Forming or attempting an alliance.
    Allying,
    /// Turning on an ally.
    Betraying,
    /// Out of the game.
    Dead,
}

/// The action an agent chose for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DecisionType {
    /// Strike a target agent (or close distance to it).
    Attack,
    /// Move away from nearby agents.
    Flee,
    /// Propose an alliance to a target agent.
    Ally,
    /// Break an alliance and strike the former ally.
    Betray,
    /// Pick up (or move toward) an item.
    Loot,
    /// Wander.
    Explore,
    /// Stay put and recover.
    Rest,
}

/// Category of a stored memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MemoryKind {
    /// Something the agent saw or experienced.
    Observation,
    /// A periodic synthesis produced by the decision backend.
    Reflection,
    /// An intention the agent formed.
    Plan,
    /// A resolved spectator vote delivered to the agent.
    InnerVoice,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Lifecycle phase of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum GamePhase {
    /// Initialized but not yet ticking.
    WaitingToStart,
    /// The match is in progress.
    Running,
    /// At most one agent remains; the world is frozen until re-init.
    Finished,
}

/// Kind of a game event published to spectators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// An agent died to another agent.
    Kill,
    /// Two agents formed an alliance.
    Alliance,
    /// An agent turned on an ally.
    Betrayal,
    /// An attack landed.
    Combat,
    /// An item was picked up.
    Loot,
    /// The safe zone contracted.
    ZoneShrink,
    /// A voting window resolved for an agent.
    Vote,
    /// The match ended.
    GameOver,
    /// An agent entered the world at init.
    AgentSpawn,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Weapon archetype of a lootable item.
///
/// The display name is what spectators see and what loot decisions match
/// against by substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ItemKind {
    /// Balanced blade.
    Sword,
    /// Heavy chopper.
    Axe,
    /// Reach weapon.
    Spear,
    /// Fast and light.
    Dagger,
    /// Ranged in spirit, still melee on the grid.
    Bow,
}

impl ItemKind {
    /// Lower-case display name used in messages and loot matching.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sword => "sword",
            Self::Axe => "axe",
            Self::Spear => "spear",
            Self::Dagger => "dagger",
            Self::Bow => "bow",
        }
    }

    /// All item kinds, in spawn-roll order.
    pub const ALL: [Self; 5] = [Self::Sword, Self::Axe, Self::Spear, Self::Dagger, Self::Bow];
}

impl core::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_kind_default_is_passable() {
        assert_eq!(TileKind::default(), TileKind::Passable);
    }

    #[test]
    fn item_kind_names_are_lowercase() {
        for kind in ItemKind::ALL {
            assert_eq!(kind.name(), kind.name().to_lowercase());
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn enums_roundtrip_serde() {
        let json = serde_json::to_string(&DecisionType::Betray).unwrap_or_default();
        let back: Result<DecisionType, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(DecisionType::Betray));
    }
}
