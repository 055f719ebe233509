//! Shared type definitions for the Skirmish simulation.
//!
//! This crate is the single source of truth for types used across the
//! Skirmish workspace. Wire-visible types flow downstream to `TypeScript`
//! via `ts-rs` for the spectator dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifier wrappers
//! - [`enums`] -- Enumeration types (tiles, actions, events, phases, items)
//! - [`structs`] -- Core entity structs (positions, memories, items, events,
//!   agent and world projections)
//! - [`decision`] -- Payloads crossing the world / decision-backend boundary
//! - [`protocol`] -- Publisher / subscriber wire messages

pub mod decision;
pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use decision::{
    Decision, DecisionContext, NearbyAgent, NearbyItem, ReflectContext, WorldContext,
};
pub use enums::{
    ActionState, DecisionType, EventKind, GamePhase, ItemKind, MemoryKind, TileKind,
};
pub use ids::{AgentId, ItemId, PlayerId, SessionId};
pub use protocol::{AgentUpdate, ClientMessage, ServerMessage};
pub use structs::{
    ActionCount, AgentDelta, AgentSnapshot, GameEvent, GridPos, Item, MemoryEntry,
    ThinkingProcess, TileMapWire, VoteStateView, WorldStateView,
    MEMORY_IMPORTANCE_MAX, MEMORY_IMPORTANCE_MIN,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::SessionId::export_all();
        let _ = crate::ids::ItemId::export_all();

        // Enums
        let _ = crate::enums::TileKind::export_all();
        let _ = crate::enums::ActionState::export_all();
        let _ = crate::enums::DecisionType::export_all();
        let _ = crate::enums::MemoryKind::export_all();
        let _ = crate::enums::GamePhase::export_all();
        let _ = crate::enums::EventKind::export_all();
        let _ = crate::enums::ItemKind::export_all();

        // Structs
        let _ = crate::structs::GridPos::export_all();
        let _ = crate::structs::MemoryEntry::export_all();
        let _ = crate::structs::Item::export_all();
        let _ = crate::structs::GameEvent::export_all();
        let _ = crate::structs::ThinkingProcess::export_all();
        let _ = crate::structs::AgentSnapshot::export_all();
        let _ = crate::structs::AgentDelta::export_all();
        let _ = crate::structs::WorldStateView::export_all();
        let _ = crate::structs::ActionCount::export_all();
        let _ = crate::structs::VoteStateView::export_all();
        let _ = crate::structs::TileMapWire::export_all();

        // Decision boundary
        let _ = crate::decision::NearbyAgent::export_all();
        let _ = crate::decision::NearbyItem::export_all();
        let _ = crate::decision::WorldContext::export_all();
        let _ = crate::decision::DecisionContext::export_all();
        let _ = crate::decision::ReflectContext::export_all();
        let _ = crate::decision::Decision::export_all();

        // Protocol
        let _ = crate::protocol::AgentUpdate::export_all();
        let _ = crate::protocol::ServerMessage::export_all();
        let _ = crate::protocol::ClientMessage::export_all();
    }
}
