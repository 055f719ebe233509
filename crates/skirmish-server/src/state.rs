//! Shared application state for the spectator gateway.
//!
//! [`AppState`] holds the broadcast channel for outbound frames, the
//! shared world behind a read-write lock, and the intent queue feeding
//! the tick driver. The gateway never mutates the world directly: every
//! inbound spectator intent travels through the queue and is applied by
//! the driver before the next tick.

use std::sync::Arc;

use skirmish_core::{Vote, World};
use skirmish_types::{AgentId, ServerMessage};
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::warn;

/// Capacity of the broadcast channel for outbound frames.
///
/// A subscriber that falls more than this many frames behind receives
/// a `Lagged` error and is disconnected; it resynchronizes with a fresh
/// full sync on reconnect.
pub const BROADCAST_CAPACITY: usize = 256;

/// Capacity of the inbound intent queue.
pub const INTENT_CAPACITY: usize = 256;

/// Delivery scope of an outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every connected subscriber.
    All,
    /// Only subscribers following this agent.
    Followers(AgentId),
}

/// A pre-serialized outbound frame.
///
/// Serialization happens once at broadcast time; session tasks only
/// clone a cheap `Arc<str>`.
#[derive(Debug, Clone)]
pub struct Outbound {
    /// Who should receive the frame.
    pub scope: Scope,
    /// The JSON payload.
    pub payload: Arc<str>,
}

/// A spectator intent queued for the tick driver.
#[derive(Debug)]
pub enum Intent {
    /// A vote tagged with the submitting session's player id.
    VoteSubmit(Vote),
}

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for outbound frames.
    pub tx: broadcast::Sender<Outbound>,
    /// The world, mutated only by the tick driver.
    pub world: Arc<RwLock<World>>,
    /// Queue of spectator intents consumed by the driver.
    pub intents: mpsc::Sender<Intent>,
}

impl AppState {
    /// Create the application state around a world and an intent queue.
    pub fn new(world: Arc<RwLock<World>>, intents: mpsc::Sender<Intent>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx, world, intents }
    }

    /// Subscribe to outbound frames.
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.tx.subscribe()
    }

    /// Serialize and broadcast one message to the given scope.
    ///
    /// Returns the number of receivers; zero simply means no spectator
    /// is connected.
    pub fn broadcast(&self, scope: Scope, message: &ServerMessage) -> usize {
        let payload = match serde_json::to_string(message) {
            Ok(json) => Arc::<str>::from(json),
            Err(e) => {
                warn!(error = %e, "failed to serialize outbound frame");
                return 0;
            }
        };
        self.tx.send(Outbound { scope, payload }).unwrap_or(0)
    }
}
