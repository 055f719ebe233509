//! Type-safe identifier wrappers.
//!
//! Every long-lived entity in the simulation has a strongly-typed ID to
//! prevent accidental mixing of identifiers at compile time. Agents,
//! players (spectator sessions) and thinking-history sessions use UUID v7
//! (time-ordered); items use a world-local monotonic counter because item
//! identity only needs to be unique and ordered within one world lifetime.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent in the simulation.
    AgentId
}

define_id! {
    /// Stable identifier for a spectator (one per connected session).
    ///
    /// Used to deduplicate votes: each player holds at most one pending
    /// vote per agent within a voting window.
    PlayerId
}

define_id! {
    /// Identifier for a thinking-history session.
    ///
    /// A session groups the reasoning artifacts produced during one world
    /// lifetime; re-initializing the world starts a fresh session.
    SessionId
}

/// Unique identifier for an item on the map.
///
/// Item IDs are assigned by the world from a monotonic counter and are
/// strictly increasing within a world lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct ItemId(pub u64);

impl ItemId {
    /// Return the inner counter value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
