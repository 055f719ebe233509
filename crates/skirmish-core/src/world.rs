//! The world: all simulation state and its snapshot projections.
//!
//! The world owns every mutable piece of the simulation -- agents,
//! items, the tile map, votes, pending events, pathfinding routes, and
//! the thinking-history store. Exactly one logical driver mutates it by
//! calling [`crate::tick::run_tick`] on a fixed cadence; everything else
//! reads snapshots.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use skirmish_agents::{Agent, roster_template};
use skirmish_map::{TileMap, mapgen};
use skirmish_types::{
    ActionState, AgentDelta, AgentId, AgentSnapshot, EventKind, GameEvent, GamePhase, GridPos,
    Item, ItemId, ItemKind, ServerMessage, SessionId, WorldStateView,
};
use tracing::{info, warn};

use crate::config::{ThinkingStorageChoice, WorldConfig};
use crate::error::WorldError;
use crate::thinking::ThinkingHistoryStore;
use crate::vote::VoteManager;

/// Events retained for full-sync snapshots.
pub(crate) const RECENT_EVENTS_CAP: usize = 20;

/// Items seeded at init and per spawn batch.
pub(crate) const ITEM_SPAWN_BATCH: u32 = 3;

/// Snapshot format version for [`World::serialize`].
const SNAPSHOT_VERSION: u32 = 1;

/// Smallest item attack bonus rolled at spawn.
const ITEM_BONUS_MIN: i32 = 2;

/// Largest item attack bonus rolled at spawn.
const ITEM_BONUS_MAX: i32 = 6;

/// The per-agent change fingerprint used for delta broadcasts.
type Fingerprint = (i32, i32, i32, bool, ActionState);

/// Versioned on-disk form of a world snapshot.
#[derive(Debug, Serialize)]
struct PersistedWorld {
    version: u32,
    tick: u64,
    phase: GamePhase,
    alive_count: u32,
    shrink_border: i32,
    zone_center: GridPos,
    winner: Option<AgentId>,
    agents: Vec<AgentSnapshot>,
    items: Vec<Item>,
    tile_map: skirmish_types::TileMapWire,
}

/// All state of one running simulation.
pub struct World {
    /// The configuration the world was built from.
    pub config: WorldConfig,
    /// Current tick number; 0 before the first tick.
    pub tick: u64,
    /// Lifecycle phase.
    pub phase: GamePhase,
    /// Number of living agents.
    pub alive_count: u32,
    /// Current side length of the safe square.
    pub shrink_border: i32,
    /// Center of the safe zone.
    pub zone_center: GridPos,
    /// All agents (dead ones included), keyed by id.
    pub agents: BTreeMap<AgentId, Agent>,
    /// Items currently on the map.
    pub items: BTreeMap<ItemId, Item>,
    /// Next item id; strictly increasing within this world lifetime.
    pub next_item_id: u64,
    /// The static map geometry.
    pub tile_map: TileMap,
    /// Events accumulated during the current tick.
    pub pending_events: Vec<GameEvent>,
    /// The last few events, for full-sync snapshots.
    pub recent_events: VecDeque<GameEvent>,
    /// Active pathfinding routes, published every tick.
    pub agent_paths: BTreeMap<AgentId, Vec<GridPos>>,
    /// The winner once the phase is Finished (None on a mutual wipe).
    pub winner: Option<AgentId>,
    /// Spectator vote aggregation.
    pub votes: VoteManager,
    /// Reasoning-artifact storage.
    pub thinking: ThinkingHistoryStore,
    /// The thinking session for this world lifetime.
    pub session_id: SessionId,
    /// Per-agent change fingerprints for delta broadcasts.
    fingerprints: BTreeMap<AgentId, Fingerprint>,
    /// The world's random source; seedable for reproducible runs.
    pub rng: StdRng,
}

impl World {
    /// Create a world from configuration. Call [`init`](Self::init)
    /// before ticking.
    pub fn new(config: WorldConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let grid = config.grid_size;
        let thinking = match config.thinking_storage {
            ThinkingStorageChoice::InMemory => ThinkingHistoryStore::in_memory(),
            ThinkingStorageChoice::Null => ThinkingHistoryStore::null(),
        };
        let votes = VoteManager::new(config.voting_window());
        Self {
            config,
            tick: 0,
            phase: GamePhase::WaitingToStart,
            alive_count: 0,
            shrink_border: grid,
            zone_center: GridPos::new(grid / 2, grid / 2),
            agents: BTreeMap::new(),
            items: BTreeMap::new(),
            next_item_id: 0,
            tile_map: mapgen::create_empty(grid, grid),
            pending_events: Vec::new(),
            recent_events: VecDeque::new(),
            agent_paths: BTreeMap::new(),
            winner: None,
            votes,
            thinking,
            session_id: SessionId::new(),
            fingerprints: BTreeMap::new(),
            rng,
        }
    }

    /// Build the map, spawn agents, and seed items for a fresh round.
    ///
    /// May be called again at any time to reset the world; the previous
    /// thinking session is cleared and a new one begins.
    ///
    /// # Errors
    ///
    /// [`WorldError::SpawnFailed`] when an agent cannot be placed on a
    /// free passable tile within the retry budget -- the map is too
    /// crowded for the configured agent count.
    pub fn init(&mut self) -> Result<(), WorldError> {
        let grid = self.config.grid_size;

        let mut map = mapgen::create_empty(grid, grid);
        mapgen::add_random_obstacles(&mut map, self.config.obstacle_density, self.config.seed);
        self.tile_map = map;

        self.tick = 0;
        self.phase = GamePhase::WaitingToStart;
        self.winner = None;
        self.shrink_border = grid;
        self.zone_center = GridPos::new(grid / 2, grid / 2);
        self.agents.clear();
        self.items.clear();
        self.next_item_id = 0;
        self.pending_events.clear();
        self.recent_events.clear();
        self.agent_paths.clear();
        self.fingerprints.clear();
        self.votes = VoteManager::new(self.config.voting_window());

        self.thinking.clear_session(self.session_id);
        self.session_id = SessionId::new();

        let attempts = self.spawn_attempt_budget();
        for index in 0..self.config.agent_count {
            let pos = self
                .random_free_tile(attempts, true)
                .ok_or(WorldError::SpawnFailed { index, attempts })?;
            let template = roster_template(usize::try_from(index).unwrap_or(0));
            let id = AgentId::new();
            let agent = Agent::from_template(id, template, pos.x, pos.y, &mut self.rng);
            self.recent_events.push_back(GameEvent::new(
                EventKind::AgentSpawn,
                0,
                format!("{} enters the arena at {}", agent.name, pos),
                vec![id],
            ));
            self.agents.insert(id, agent);
        }
        self.alive_count = self.config.agent_count;

        self.spawn_items(ITEM_SPAWN_BATCH);
        while self.recent_events.len() > RECENT_EVENTS_CAP {
            self.recent_events.pop_front();
        }

        self.phase = GamePhase::Running;
        info!(
            agents = self.config.agent_count,
            grid,
            session = %self.session_id,
            "world initialized"
        );
        Ok(())
    }

    /// Placement retries per entity: `2 * grid^2`.
    pub(crate) fn spawn_attempt_budget(&self) -> u32 {
        let grid = u32::try_from(self.config.grid_size).unwrap_or(0);
        grid.saturating_mul(grid).saturating_mul(2).max(1)
    }

    /// A random passable tile, optionally avoiding occupied ones.
    ///
    /// Returns `None` after `attempts` failed draws.
    pub(crate) fn random_free_tile(&mut self, attempts: u32, avoid_agents: bool) -> Option<GridPos> {
        let grid = self.config.grid_size;
        if grid <= 0 {
            return None;
        }
        for _ in 0..attempts {
            let x = self.rng.random_range(0..grid);
            let y = self.rng.random_range(0..grid);
            if !self.tile_map.is_passable(x, y) {
                continue;
            }
            if avoid_agents
                && self
                    .agents
                    .values()
                    .any(|a| a.alive && a.x == x && a.y == y)
            {
                continue;
            }
            return Some(GridPos::new(x, y));
        }
        None
    }

    /// Spawn up to `count` items on random passable tiles.
    ///
    /// A placement that exhausts its retry budget is logged and skipped;
    /// item spawning is best-effort.
    pub(crate) fn spawn_items(&mut self, count: u32) {
        let attempts = self.spawn_attempt_budget();
        for _ in 0..count {
            let Some(pos) = self.random_free_tile(attempts, false) else {
                warn!(attempts, "no free tile for item spawn, skipping");
                continue;
            };
            let kind_index = self.rng.random_range(0..ItemKind::ALL.len());
            let kind = ItemKind::ALL.get(kind_index).copied().unwrap_or(ItemKind::Sword);
            let bonus = self.rng.random_range(ITEM_BONUS_MIN..=ITEM_BONUS_MAX);
            let id = ItemId(self.next_item_id);
            self.next_item_id = self.next_item_id.saturating_add(1);
            self.items.insert(
                id,
                Item {
                    id,
                    x: pos.x,
                    y: pos.y,
                    kind,
                    bonus,
                },
            );
        }
    }

    /// Append an event to the current tick's batch.
    pub(crate) fn push_event(
        &mut self,
        kind: EventKind,
        message: impl Into<String>,
        agent_ids: Vec<AgentId>,
    ) {
        self.pending_events
            .push(GameEvent::new(kind, self.tick, message, agent_ids));
    }

    // -----------------------------------------------------------------------
    // Snapshot API
    // -----------------------------------------------------------------------

    /// The lightweight per-tick world summary.
    pub fn world_state(&self) -> WorldStateView {
        WorldStateView {
            tick: self.tick,
            alive_count: self.alive_count,
            shrink_border: self.shrink_border,
            phase: self.phase,
            zone_center: self.zone_center,
        }
    }

    /// Full agent snapshots in id order.
    pub fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.values().map(Agent::snapshot).collect()
    }

    /// The complete snapshot sent to a newly connected subscriber.
    pub fn full_sync(&self) -> ServerMessage {
        ServerMessage::SyncFull {
            tick: self.tick,
            world: self.world_state(),
            agents: self.agent_snapshots(),
            items: self.items.values().copied().collect(),
            votes: self.votes.state(),
            events: self.recent_events.iter().cloned().collect(),
            tile_map: self.tile_map.to_wire(),
        }
    }

    /// Agents whose `(x, y, hp, alive, action_state)` fingerprint changed
    /// since the previous call; fingerprints update as a side effect.
    pub fn agent_deltas(&mut self) -> Vec<AgentDelta> {
        let mut changed = Vec::new();
        for agent in self.agents.values() {
            let fingerprint: Fingerprint =
                (agent.x, agent.y, agent.hp, agent.alive, agent.action_state);
            if self.fingerprints.get(&agent.id) != Some(&fingerprint) {
                self.fingerprints.insert(agent.id, fingerprint);
                changed.push(agent.delta());
            }
        }
        changed
    }

    /// Opaque versioned JSON for future persistence backends.
    pub fn serialize(&self) -> Result<Vec<u8>, WorldError> {
        let persisted = PersistedWorld {
            version: SNAPSHOT_VERSION,
            tick: self.tick,
            phase: self.phase,
            alive_count: self.alive_count,
            shrink_border: self.shrink_border,
            zone_center: self.zone_center,
            winner: self.winner,
            agents: self.agent_snapshots(),
            items: self.items.values().copied().collect(),
            tile_map: self.tile_map.to_wire(),
        };
        serde_json::to_vec(&persisted).map_err(|e| WorldError::Snapshot(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Verify the universal invariants; a violation is fatal.
    pub fn check_invariants(&self) -> Result<(), WorldError> {
        let live = self.agents.values().filter(|a| a.alive).count();
        if u32::try_from(live).ok() != Some(self.alive_count) {
            return Err(WorldError::InvariantViolation(format!(
                "alive_count {} but {live} agents are alive",
                self.alive_count
            )));
        }

        let border_floor = self.config.min_border.min(self.config.grid_size);
        if self.shrink_border < border_floor {
            return Err(WorldError::InvariantViolation(format!(
                "shrink_border {} fell below the floor {border_floor}",
                self.shrink_border
            )));
        }

        for agent in self.agents.values() {
            if !self.tile_map.is_passable(agent.x, agent.y) {
                return Err(WorldError::InvariantViolation(format!(
                    "{} stands on an impassable tile ({}, {})",
                    agent.name, agent.x, agent.y
                )));
            }
            if agent.hp < 0 || agent.hp > agent.max_hp {
                return Err(WorldError::InvariantViolation(format!(
                    "{} has hp {} outside [0, {}]",
                    agent.name, agent.hp, agent.max_hp
                )));
            }
            if agent.alive != (agent.hp > 0) {
                return Err(WorldError::InvariantViolation(format!(
                    "{} has alive={} with hp={}",
                    agent.name, agent.alive, agent.hp
                )));
            }
            if agent.alliances.contains(&agent.id) || agent.enemies.contains(&agent.id) {
                return Err(WorldError::InvariantViolation(format!(
                    "{} lists itself as a relation",
                    agent.name
                )));
            }
            if agent.alliances.intersection(&agent.enemies).next().is_some() {
                return Err(WorldError::InvariantViolation(format!(
                    "{} has overlapping alliances and enemies",
                    agent.name
                )));
            }
            for ally in &agent.alliances {
                if !self.agents.get(ally).is_some_and(|a| a.alive) {
                    return Err(WorldError::InvariantViolation(format!(
                        "{} is allied with a dead or unknown agent",
                        agent.name
                    )));
                }
            }
        }

        for (agent_id, waypoints) in &self.agent_paths {
            for wp in waypoints {
                if !self.tile_map.is_passable(wp.x, wp.y) {
                    return Err(WorldError::InvariantViolation(format!(
                        "path of {agent_id} crosses impassable {wp}"
                    )));
                }
            }
            for pair in waypoints.windows(2) {
                if let [a, b] = pair
                    && !a.adjacent(*b)
                {
                    return Err(WorldError::InvariantViolation(format!(
                        "path of {agent_id} jumps from {a} to {b}"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> WorldConfig {
        WorldConfig {
            grid_size: 10,
            agent_count: 4,
            obstacle_density: 0.1,
            seed: Some(42),
            ..WorldConfig::default()
        }
    }

    #[test]
    fn init_spawns_agents_on_passable_tiles() {
        let mut world = World::new(small_config());
        assert_eq!(world.phase, GamePhase::WaitingToStart);
        assert!(world.init().is_ok());

        assert_eq!(world.phase, GamePhase::Running);
        assert_eq!(world.agents.len(), 4);
        assert_eq!(world.alive_count, 4);
        for agent in world.agents.values() {
            assert!(world.tile_map.is_passable(agent.x, agent.y));
            assert!(agent.alive);
        }
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn init_seeds_items_and_spawn_events() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());
        assert_eq!(world.items.len(), 3);
        let spawn_events = world
            .recent_events
            .iter()
            .filter(|e| e.kind == EventKind::AgentSpawn)
            .count();
        assert_eq!(spawn_events, 4);
    }

    #[test]
    fn init_is_deterministic_under_a_seed() {
        let mut a = World::new(small_config());
        let mut b = World::new(small_config());
        assert!(a.init().is_ok());
        assert!(b.init().is_ok());
        assert_eq!(a.tile_map, b.tile_map);
        let pos_a: Vec<(i32, i32)> = a.agents.values().map(|ag| (ag.x, ag.y)).collect();
        let pos_b: Vec<(i32, i32)> = b.agents.values().map(|ag| (ag.x, ag.y)).collect();
        assert_eq!(pos_a, pos_b);
    }

    #[test]
    fn reinit_resets_state_and_session() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());
        let first_session = world.session_id;
        let first_ids: Vec<AgentId> = world.agents.keys().copied().collect();

        world.tick = 99;
        world.winner = first_ids.first().copied();
        assert!(world.init().is_ok());

        assert_eq!(world.tick, 0);
        assert!(world.winner.is_none());
        assert_ne!(world.session_id, first_session);
        // Fresh agents, fresh ids.
        assert!(world.agents.keys().all(|id| !first_ids.contains(id)));
    }

    #[test]
    fn crowded_map_fails_spawn() {
        let config = WorldConfig {
            grid_size: 2,
            agent_count: 10,
            obstacle_density: 1.0,
            seed: Some(1),
            ..WorldConfig::default()
        };
        let mut world = World::new(config);
        assert!(matches!(
            world.init(),
            Err(WorldError::SpawnFailed { .. })
        ));
    }

    #[test]
    fn item_ids_strictly_increase() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());
        world.spawn_items(3);
        let ids: Vec<u64> = world.items.keys().map(|id| id.0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids.len(), sorted.len());
        assert_eq!(world.next_item_id, 6);
    }

    #[test]
    fn agent_deltas_track_changes() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());

        // First call: everything is new.
        assert_eq!(world.agent_deltas().len(), 4);
        // No changes: empty delta.
        assert!(world.agent_deltas().is_empty());

        // Move one agent; only it shows up.
        let id = world.agents.keys().next().copied();
        if let Some(id) = id
            && let Some(agent) = world.agents.get_mut(&id)
        {
            agent.x = (agent.x + 1).min(world.config.grid_size - 1);
            agent.hp -= 1;
        }
        let deltas = world.agent_deltas();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas.first().map(|d| d.id), id);
    }

    #[test]
    fn serialize_is_versioned_json() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());
        let bytes = world.serialize().unwrap_or_default();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();
        assert_eq!(value.get("version").and_then(serde_json::Value::as_u64), Some(1));
        assert!(value.get("agents").is_some());
        assert!(value.get("tile_map").is_some());
    }

    #[test]
    fn invariant_catches_alive_count_drift() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());
        world.alive_count = 99;
        assert!(matches!(
            world.check_invariants(),
            Err(WorldError::InvariantViolation(_))
        ));
    }

    #[test]
    fn invariant_catches_self_alliance() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());
        let id = world.agents.keys().next().copied();
        if let Some(id) = id
            && let Some(agent) = world.agents.get_mut(&id)
        {
            agent.alliances.insert(id);
        }
        assert!(world.check_invariants().is_err());
    }

    #[test]
    fn full_sync_carries_the_map() {
        let mut world = World::new(small_config());
        assert!(world.init().is_ok());
        let msg = world.full_sync();
        if let ServerMessage::SyncFull { tile_map, agents, .. } = msg {
            assert_eq!(tile_map.width, 10);
            assert_eq!(tile_map.tiles.len(), 100);
            assert_eq!(agents.len(), 4);
        } else {
            assert!(false, "full_sync must produce SyncFull");
        }
    }
}
