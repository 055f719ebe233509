//! The agent entity: stats, relationships, perception, and movement.
//!
//! Agents are owned by the world and mutated only from the tick loop.
//! Relationships are sets of [`AgentId`] rather than references, so death
//! cleanup is a set removal and there are no ownership cycles.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, Utc};
use rand::Rng;
use skirmish_map::TileMap;
use skirmish_types::{
    ActionState, AgentDelta, AgentId, AgentSnapshot, GridPos, Item, ItemId, ItemKind, MemoryKind,
    NearbyAgent, NearbyItem, ThinkingProcess,
};
use tracing::debug;

use crate::memory::MemoryStream;
use crate::template::AgentTemplate;

/// Seconds an inner-voice memory stays consumable by a decision.
pub const INNER_VOICE_WINDOW_SECS: i64 = 30;

/// Importance of the inner-voice memory delivered on vote resolution.
const INNER_VOICE_IMPORTANCE: u8 = 9;

/// Prefix attached to stored inner-voice memories; stripped when the
/// voice is handed to the decision backend.
const INNER_VOICE_PREFIX: &str = "[Inner voice]";

/// Attempts made by [`Agent::move_random`] before giving up.
const RANDOM_MOVE_ATTEMPTS: u32 = 8;

/// One combatant in the arena.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Identifier, unique within the world.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Personality keyword driving rule-based behavior.
    pub personality: String,
    /// Flavor description.
    pub description: String,
    /// Current hit points; zero exactly when dead.
    pub hp: i32,
    /// Hit point ceiling.
    pub max_hp: i32,
    /// Attack stat (base plus looted bonuses).
    pub attack: i32,
    /// Defense stat.
    pub defense: i32,
    /// Equipped weapon from the last looted item.
    pub weapon: Option<ItemKind>,
    /// Kills credited to this agent.
    pub kill_count: u32,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Whether the agent is still in the game.
    pub alive: bool,
    /// Current activity tag.
    pub action_state: ActionState,
    /// Allied agents. Disjoint from `enemies`; never contains `id`.
    pub alliances: BTreeSet<AgentId>,
    /// Hostile agents. Disjoint from `alliances`; never contains `id`.
    pub enemies: BTreeSet<AgentId>,
    /// Free-text description of the current action.
    pub current_action: String,
    /// The agent's memory stream.
    pub memory: MemoryStream,
    /// Active waypoint route, start first.
    pub waypoints: Vec<GridPos>,
    /// Index of the waypoint currently being approached.
    pub current_waypoint_index: usize,
    /// Latest reasoning artifact.
    pub thinking: Option<ThinkingProcess>,
}

impl Agent {
    /// Spawn an agent from a template at the given tile.
    ///
    /// Stats are jittered so two agents from the same template differ.
    /// The memory stream is seeded with an identity observation.
    pub fn from_template(
        id: AgentId,
        template: &AgentTemplate,
        x: i32,
        y: i32,
        rng: &mut impl Rng,
    ) -> Self {
        let stats = template.jittered_stats(rng);
        let mut memory = MemoryStream::new();
        memory.add(
            format!(
                "I am {}, {} -- {}",
                template.name, template.personality, template.description
            ),
            8,
            MemoryKind::Observation,
        );
        Self {
            id,
            name: template.name.to_owned(),
            personality: template.personality.to_owned(),
            description: template.description.to_owned(),
            hp: stats.hp,
            max_hp: stats.hp,
            attack: stats.attack,
            defense: stats.defense,
            weapon: None,
            kill_count: 0,
            x,
            y,
            alive: true,
            action_state: ActionState::Idle,
            alliances: BTreeSet::new(),
            enemies: BTreeSet::new(),
            current_action: String::from("waiting"),
            memory,
            waypoints: Vec::new(),
            current_waypoint_index: 0,
            thinking: None,
        }
    }

    /// The agent's tile as a [`GridPos`].
    pub const fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }

    // -----------------------------------------------------------------------
    // Perception
    // -----------------------------------------------------------------------

    /// Everything within `vision_range` Manhattan distance: living agents
    /// (excluding self) and items, both nearest first.
    pub fn perceive(
        &self,
        agents: &BTreeMap<AgentId, Self>,
        items: &BTreeMap<ItemId, Item>,
        vision_range: u32,
    ) -> (Vec<NearbyAgent>, Vec<NearbyItem>) {
        let here = self.pos();

        let mut nearby_agents: Vec<NearbyAgent> = agents
            .values()
            .filter(|other| other.id != self.id && other.alive)
            .filter_map(|other| {
                let distance = here.manhattan(other.pos());
                (distance <= vision_range).then(|| NearbyAgent {
                    id: other.id,
                    name: other.name.clone(),
                    hp: other.hp,
                    max_hp: other.max_hp,
                    x: other.x,
                    y: other.y,
                    distance,
                    is_ally: self.alliances.contains(&other.id),
                    is_enemy: self.enemies.contains(&other.id),
                })
            })
            .collect();
        nearby_agents.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.id.cmp(&b.id)));

        let mut nearby_items: Vec<NearbyItem> = items
            .values()
            .filter_map(|item| {
                let distance = here.manhattan(item.pos());
                (distance <= vision_range).then_some(NearbyItem {
                    id: item.id,
                    kind: item.kind,
                    x: item.x,
                    y: item.y,
                    distance,
                })
            })
            .collect();
        nearby_items.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.id.cmp(&b.id)));

        (nearby_agents, nearby_items)
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Step one cell toward `(tx, ty)` in each axis, clamped to the map.
    ///
    /// The move only happens when the destination tile is passable;
    /// otherwise the agent stays put.
    pub fn move_toward(&mut self, tx: i32, ty: i32, map: &TileMap) {
        let nx = clamp_axis(self.x.saturating_add((tx - self.x).signum()), map.width());
        let ny = clamp_axis(self.y.saturating_add((ty - self.y).signum()), map.height());
        if map.is_passable(nx, ny) {
            self.x = nx;
            self.y = ny;
        }
    }

    /// Step one cell away from `(fx, fy)`; a zero delta defaults to +1.
    pub fn move_away_from(&mut self, fx: i32, fy: i32, map: &TileMap) {
        let dx = away_step(self.x, fx);
        let dy = away_step(self.y, fy);
        let nx = clamp_axis(self.x.saturating_add(dx), map.width());
        let ny = clamp_axis(self.y.saturating_add(dy), map.height());
        if map.is_passable(nx, ny) {
            self.x = nx;
            self.y = ny;
        }
    }

    /// Try up to 8 random one-cell offsets and take the first passable one.
    pub fn move_random(&mut self, map: &TileMap, rng: &mut impl Rng) {
        for _ in 0..RANDOM_MOVE_ATTEMPTS {
            let dx = rng.random_range(-1..=1);
            let dy = rng.random_range(-1..=1);
            let nx = clamp_axis(self.x.saturating_add(dx), map.width());
            let ny = clamp_axis(self.y.saturating_add(dy), map.height());
            if map.is_passable(nx, ny) {
                self.x = nx;
                self.y = ny;
                return;
            }
        }
    }

    /// Install a waypoint route and reset progress along it.
    pub fn set_path(&mut self, waypoints: Vec<GridPos>) {
        self.waypoints = waypoints;
        self.current_waypoint_index = 0;
    }

    /// Drop any active route.
    pub fn clear_path(&mut self) {
        self.waypoints.clear();
        self.current_waypoint_index = 0;
    }

    /// Whether a route is active and unfinished.
    pub fn has_path(&self) -> bool {
        self.current_waypoint_index < self.waypoints.len()
    }

    /// Advance one step along the active route.
    ///
    /// Movement is one axis at a time with the x axis taking priority.
    /// Reaching the current waypoint advances the index and retries so a
    /// zero-length hop does not waste the tick. A blocked step clears the
    /// whole route and the agent stays put.
    pub fn follow_path(&mut self, map: &TileMap) {
        loop {
            let Some(&target) = self.waypoints.get(self.current_waypoint_index) else {
                // Route exhausted.
                self.clear_path();
                return;
            };

            if self.pos() == target {
                self.current_waypoint_index = self.current_waypoint_index.saturating_add(1);
                continue;
            }

            let (nx, ny) = if self.x != target.x {
                (self.x.saturating_add((target.x - self.x).signum()), self.y)
            } else {
                (self.x, self.y.saturating_add((target.y - self.y).signum()))
            };

            if map.is_passable(nx, ny) {
                self.x = nx;
                self.y = ny;
            } else {
                debug!(agent = %self.name, x = nx, y = ny, "path step blocked, dropping route");
                self.clear_path();
            }
            return;
        }
    }

    // -----------------------------------------------------------------------
    // Damage and inner voice
    // -----------------------------------------------------------------------

    /// Apply damage, clamping hp at zero. Returns `true` when this kills.
    ///
    /// A kill flips `alive` and parks the agent in the dead state; the
    /// agent stays in the world for the rest of the match.
    pub fn take_damage(&mut self, amount: i32, source: &str) -> bool {
        if !self.alive {
            return false;
        }
        self.hp = (self.hp - amount.max(0)).max(0);
        self.memory.add(
            format!("Took {amount} damage from {source}"),
            6,
            MemoryKind::Observation,
        );
        if self.hp == 0 {
            self.alive = false;
            self.action_state = ActionState::Dead;
            self.clear_path();
            return true;
        }
        false
    }

    /// Deliver a resolved spectator vote as a high-importance memory.
    pub fn hear_inner_voice(&mut self, message: &str) {
        self.memory.add(
            format!("{INNER_VOICE_PREFIX} {message}"),
            INNER_VOICE_IMPORTANCE,
            MemoryKind::InnerVoice,
        );
    }

    /// The freshest inner voice within the consumption window, with the
    /// bracketed prefix stripped. `None` once the voice has gone stale.
    pub fn recent_inner_voice(&self) -> Option<String> {
        let entry = self.memory.latest_of_kind(MemoryKind::InnerVoice)?;
        let age = Utc::now() - entry.timestamp;
        if age > Duration::seconds(INNER_VOICE_WINDOW_SECS) {
            return None;
        }
        let text = entry
            .text
            .split_once(']')
            .map_or(entry.text.as_str(), |(_, rest)| rest)
            .trim();
        Some(text.to_owned())
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    /// Full wire-form snapshot of this agent.
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            name: self.name.clone(),
            personality: self.personality.clone(),
            description: self.description.clone(),
            hp: self.hp,
            max_hp: self.max_hp,
            attack: self.attack,
            defense: self.defense,
            weapon: self.weapon,
            kill_count: self.kill_count,
            x: self.x,
            y: self.y,
            alive: self.alive,
            action_state: self.action_state,
            alliances: self.alliances.iter().copied().collect(),
            enemies: self.enemies.iter().copied().collect(),
            current_action: self.current_action.clone(),
            thinking: self.thinking.clone(),
        }
    }

    /// Minimal delta-form projection (the change fingerprint fields).
    pub const fn delta(&self) -> AgentDelta {
        AgentDelta {
            id: self.id,
            x: self.x,
            y: self.y,
            hp: self.hp,
            alive: self.alive,
            action_state: self.action_state,
        }
    }
}

/// Clamp a coordinate into `[0, extent)`.
fn clamp_axis(value: i32, extent: i32) -> i32 {
    value.clamp(0, extent.saturating_sub(1).max(0))
}

/// One step away from `from`: the opposite sign of the delta, defaulting
/// to +1 when the positions share the axis value.
fn away_step(own: i32, from: i32) -> i32 {
    match (own - from).signum() {
        0 => 1,
        sign => sign,
    }
}
