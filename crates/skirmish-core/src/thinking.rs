//! Bounded storage for agent reasoning artifacts.
//!
//! Spectators can ask "what was this agent thinking" for the last few
//! decisions. The in-memory store keeps a FIFO ring of at most 50
//! entries per `(session, agent)` and at most 10 sessions, evicting the
//! least-recently-stored session when an 11th appears. The null store
//! drops everything and is the safe default when persistence is off.

use std::collections::{BTreeMap, VecDeque};

use skirmish_types::{AgentId, SessionId, ThinkingProcess};
use tracing::debug;

/// Maximum entries retained per `(session, agent)`.
pub const MAX_ENTRIES_PER_AGENT: usize = 50;

/// Maximum sessions retained before LRU eviction.
pub const MAX_SESSIONS: usize = 10;

/// Per-session storage slot.
#[derive(Debug, Default)]
struct SessionSlot {
    /// Monotonic use stamp for LRU eviction.
    last_used: u64,
    /// FIFO ring of artifacts per agent.
    per_agent: BTreeMap<AgentId, VecDeque<ThinkingProcess>>,
}

/// The bounded in-memory variant.
#[derive(Debug, Default)]
pub struct InMemoryThinkingStore {
    sessions: BTreeMap<SessionId, SessionSlot>,
    use_counter: u64,
}

impl InMemoryThinkingStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            use_counter: 0,
        }
    }

    /// Append an artifact for `(session, agent)`, evicting as needed.
    fn store(&mut self, session_id: SessionId, agent_id: AgentId, thinking: ThinkingProcess) {
        self.use_counter = self.use_counter.wrapping_add(1);
        let stamp = self.use_counter;

        if !self.sessions.contains_key(&session_id) && self.sessions.len() >= MAX_SESSIONS {
            self.evict_lru();
        }

        let slot = self.sessions.entry(session_id).or_default();
        slot.last_used = stamp;

        let ring = slot.per_agent.entry(agent_id).or_default();
        ring.push_back(thinking);
        if ring.len() > MAX_ENTRIES_PER_AGENT {
            ring.pop_front();
        }
    }

    /// Drop the least-recently-stored session.
    fn evict_lru(&mut self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(&id, _)| id);
        if let Some(id) = oldest {
            debug!(session = %id, "evicting least-recently-used thinking session");
            self.sessions.remove(&id);
        }
    }

    /// Newest-first history for `(session, agent)`, at most `limit`.
    fn history(
        &self,
        session_id: SessionId,
        agent_id: AgentId,
        limit: usize,
    ) -> Vec<ThinkingProcess> {
        self.sessions
            .get(&session_id)
            .and_then(|slot| slot.per_agent.get(&agent_id))
            .map(|ring| ring.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Entries stored for `(session, agent)`.
    fn count(&self, session_id: SessionId, agent_id: AgentId) -> usize {
        self.sessions
            .get(&session_id)
            .and_then(|slot| slot.per_agent.get(&agent_id))
            .map_or(0, VecDeque::len)
    }

    /// Remove a whole session.
    fn clear_session(&mut self, session_id: SessionId) {
        self.sessions.remove(&session_id);
    }
}

/// Storage for reasoning artifacts, selected by configuration.
#[derive(Debug)]
pub enum ThinkingHistoryStore {
    /// Bounded in-memory rings with session LRU.
    InMemory(InMemoryThinkingStore),
    /// Discard everything.
    Null,
}

impl ThinkingHistoryStore {
    /// The bounded in-memory variant.
    pub const fn in_memory() -> Self {
        Self::InMemory(InMemoryThinkingStore::new())
    }

    /// The no-op variant.
    pub const fn null() -> Self {
        Self::Null
    }

    /// Append an artifact for `(session, agent)`.
    pub fn store(&mut self, session_id: SessionId, agent_id: AgentId, thinking: ThinkingProcess) {
        match self {
            Self::InMemory(store) => store.store(session_id, agent_id, thinking),
            Self::Null => {}
        }
    }

    /// Newest-first history for `(session, agent)`, at most `limit`.
    pub fn history(
        &self,
        session_id: SessionId,
        agent_id: AgentId,
        limit: usize,
    ) -> Vec<ThinkingProcess> {
        match self {
            Self::InMemory(store) => store.history(session_id, agent_id, limit),
            Self::Null => Vec::new(),
        }
    }

    /// Entries stored for `(session, agent)`.
    pub fn count(&self, session_id: SessionId, agent_id: AgentId) -> usize {
        match self {
            Self::InMemory(store) => store.count(session_id, agent_id),
            Self::Null => 0,
        }
    }

    /// Remove a whole session.
    pub fn clear_session(&mut self, session_id: SessionId) {
        match self {
            Self::InMemory(store) => store.clear_session(session_id),
            Self::Null => {}
        }
    }
}
