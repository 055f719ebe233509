//! The tick cycle: one discrete step of the simulation.
//!
//! Each tick runs these steps in order:
//!
//! 1. Advance the tick counter; clear the event batch.
//! 2. **Zone** -- shrink the safe square on schedule and damage every
//!    living agent caught outside it.
//! 3. **Items** -- spawn a small batch every tenth tick.
//! 4. **Votes** -- resolve an elapsed voting window; winners become
//!    inner voices, delivered before any decision that could read them.
//! 5. **Agents** -- build one decision context per living agent from the
//!    pre-tick snapshot, fan the `decide` calls out to the backend in
//!    parallel, then apply the results sequentially in randomized order.
//!    Every fifth tick the backend also reflects for each agent.
//! 6. **Win check** -- one (or zero) agents left ends the match.
//! 7. Verify invariants and return the tick's events for publication.
//!
//! The world is single-writer: this function is the only mutation path,
//! and the decision fan-out is the only concurrency inside it.

use futures::future::join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use skirmish_backend::DecisionBackend;
use skirmish_types::{
    ActionState, AgentId, Decision, DecisionContext, DecisionType, EventKind, GameEvent,
    GamePhase, GridPos, ItemId, MemoryKind, ReflectContext, WorldContext,
};
use tracing::{debug, info};

use crate::error::WorldError;
use crate::world::{ITEM_SPAWN_BATCH, RECENT_EVENTS_CAP, World};

/// Ticks between item spawn batches.
const ITEM_SPAWN_INTERVAL: u64 = 10;

/// Ticks between reflection passes.
const REFLECT_INTERVAL: u64 = 5;

/// Importance of a stored reflection memory.
const REFLECTION_IMPORTANCE: u8 = 7;

/// Damage applied per tick to agents outside the safe zone.
const ZONE_DAMAGE: i32 = 10;

/// Memories included in a decision context.
const CONTEXT_MEMORY_COUNT: usize = 5;

/// Memories included in a reflection context.
const REFLECT_MEMORY_COUNT: usize = 8;

/// Ally proposals land within this Manhattan distance.
const ALLY_RANGE: u32 = 2;

/// Probability an alliance proposal is accepted.
const ALLY_ACCEPT_CHANCE: f64 = 0.6;

/// Flat bonus a betrayal strike adds on top of attack.
const BETRAYAL_BONUS: i32 = 5;

/// Execute one complete tick of the simulation.
///
/// Worlds that are not `Running` tick as no-ops, so a driver may keep
/// its cadence across a finished match until `init` is called again.
///
/// # Errors
///
/// [`WorldError::InvariantViolation`] when the post-tick state is
/// corrupted; the caller must halt the simulation.
pub async fn run_tick(
    world: &mut World,
    backend: &DecisionBackend,
) -> Result<Vec<GameEvent>, WorldError> {
    if world.phase != GamePhase::Running {
        return Ok(Vec::new());
    }

    world.tick = world.tick.wrapping_add(1);
    world.pending_events.clear();
    let tick = world.tick;
    debug!(tick, alive = world.alive_count, "tick started");

    zone_step(world);

    if tick % ITEM_SPAWN_INTERVAL == 0 {
        world.spawn_items(ITEM_SPAWN_BATCH);
    }

    vote_step(world);

    agent_step(world, backend).await;

    if tick % REFLECT_INTERVAL == 0 {
        reflect_step(world, backend).await;
    }

    win_check(world);

    world.check_invariants()?;

    let events = world.pending_events.clone();
    for event in &events {
        world.recent_events.push_back(event.clone());
    }
    while world.recent_events.len() > RECENT_EVENTS_CAP {
        world.recent_events.pop_front();
    }
    Ok(events)
}

// ---------------------------------------------------------------------------
// Step 2: zone
// ---------------------------------------------------------------------------

/// Shrink the safe square on schedule, then hurt everyone outside it.
fn zone_step(world: &mut World) {
    let interval = world.config.shrink_interval_ticks;
    if interval > 0
        && world.tick % interval == 0
        && world.shrink_border > world.config.min_border
    {
        world.shrink_border -= 1;
        let border = world.shrink_border;
        world.push_event(
            EventKind::ZoneShrink,
            format!("The safe zone contracts to a side of {border}"),
            Vec::new(),
        );
    }

    let center = world.zone_center;
    let half = world.shrink_border / 2;
    let victims: Vec<AgentId> = world
        .agents
        .values()
        .filter(|a| {
            a.alive && ((a.x - center.x).abs() > half || (a.y - center.y).abs() > half)
        })
        .map(|a| a.id)
        .collect();

    for id in victims {
        let killed = world
            .agents
            .get_mut(&id)
            .is_some_and(|a| a.take_damage(ZONE_DAMAGE, "the zone"));
        if killed {
            handle_death(world, id, None);
        }
    }
}

// ---------------------------------------------------------------------------
// Step 4: votes
// ---------------------------------------------------------------------------

/// Resolve an elapsed voting window into inner voices.
///
/// Votes for agents that are no longer alive at resolution time are
/// discarded.
fn vote_step(world: &mut World) {
    let Some(resolution) = world.votes.tick() else {
        return;
    };
    for (agent_id, action) in resolution {
        let Some(agent) = world.agents.get_mut(&agent_id) else {
            continue;
        };
        if !agent.alive {
            continue;
        }
        agent.hear_inner_voice(&action);
        let name = agent.name.clone();
        world.push_event(
            EventKind::Vote,
            format!("The crowd urges {name}: {action}"),
            vec![agent_id],
        );
    }
}

// ---------------------------------------------------------------------------
// Step 5: agents
// ---------------------------------------------------------------------------

/// The parallel decide / sequential apply pass over living agents.
async fn agent_step(world: &mut World, backend: &DecisionBackend) {
    let mut order: Vec<AgentId> = world
        .agents
        .values()
        .filter(|a| a.alive)
        .map(|a| a.id)
        .collect();
    order.shuffle(&mut world.rng);

    // All contexts come from the same pre-tick snapshot so concurrent
    // decisions read consistent state.
    let contexts: Vec<DecisionContext> = order
        .iter()
        .filter_map(|id| world.agents.get(id).map(|agent| build_context(world, agent)))
        .collect();

    let decisions = join_all(contexts.iter().map(|ctx| backend.decide(ctx))).await;

    for (ctx, decision) in contexts.iter().zip(decisions) {
        let id = ctx.agent_id;
        if !world.agents.get(&id).is_some_and(|a| a.alive) {
            // Died earlier in this application pass.
            continue;
        }

        let thinking = decision.thinking.clone();
        if let Some(agent) = world.agents.get_mut(&id) {
            agent.current_action = describe_decision(&decision, ctx);
            if thinking.is_some() {
                agent.thinking.clone_from(&thinking);
            }
        }
        if let Some(artifact) = thinking {
            world.thinking.store(world.session_id, id, artifact);
        }

        execute_decision(world, id, ctx, &decision);
    }
}

/// Assemble one agent's decision context from world state.
fn build_context(world: &World, agent: &skirmish_agents::Agent) -> DecisionContext {
    let (nearby_agents, nearby_items) =
        agent.perceive(&world.agents, &world.items, world.config.vision_range);
    DecisionContext {
        agent_id: agent.id,
        name: agent.name.clone(),
        personality: agent.personality.clone(),
        hp: agent.hp,
        max_hp: agent.max_hp,
        attack: agent.attack,
        defense: agent.defense,
        pos: agent.pos(),
        nearby_agents,
        nearby_items,
        recent_memories: agent
            .memory
            .recent(CONTEXT_MEMORY_COUNT)
            .iter()
            .map(|e| e.text.clone())
            .collect(),
        inner_voice: agent.recent_inner_voice(),
        world: WorldContext {
            tick: world.tick,
            alive_count: world.alive_count,
            shrink_border: world.shrink_border,
            zone_center: world.zone_center,
        },
    }
}

/// Spectator-facing description of a decision.
fn describe_decision(decision: &Decision, ctx: &DecisionContext) -> String {
    let target_name = decision.target_agent.and_then(|id| {
        ctx.nearby_agents
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.clone())
    });
    match (decision.kind, target_name) {
        (DecisionType::Attack, Some(name)) => format!("attacking {name}"),
        (DecisionType::Ally, Some(name)) => format!("proposing an alliance to {name}"),
        (DecisionType::Betray, Some(name)) => format!("turning on {name}"),
        (DecisionType::Loot, _) => String::from("going for loot"),
        (DecisionType::Flee, _) => String::from("fleeing"),
        (DecisionType::Rest, _) => String::from("resting"),
        _ => String::from("exploring"),
    }
}

/// Apply one agent's decision to the world.
fn execute_decision(world: &mut World, actor_id: AgentId, ctx: &DecisionContext, decision: &Decision) {
    match decision.kind {
        DecisionType::Attack => match decision.target_agent {
            Some(target) => execute_attack(world, actor_id, target),
            None => wander(world, actor_id, ActionState::Exploring),
        },
        DecisionType::Ally => match decision.target_agent {
            Some(target) => execute_ally(world, actor_id, target),
            None => wander(world, actor_id, ActionState::Exploring),
        },
        DecisionType::Betray => match decision.target_agent {
            Some(target) => execute_betray(world, actor_id, target),
            None => wander(world, actor_id, ActionState::Exploring),
        },
        DecisionType::Loot => match decision.target_item {
            Some(item) => execute_loot(world, actor_id, item),
            None => wander(world, actor_id, ActionState::Exploring),
        },
        DecisionType::Flee => execute_flee(world, actor_id, ctx),
        DecisionType::Explore => wander(world, actor_id, ActionState::Exploring),
        DecisionType::Rest => wander(world, actor_id, ActionState::Idle),
    }
}

/// Strike an adjacent target, or close the distance toward it.
fn execute_attack(world: &mut World, actor_id: AgentId, target_id: AgentId) {
    let Some((target_pos, target_defense, target_name, target_alive)) = world
        .agents
        .get(&target_id)
        .map(|t| (t.pos(), t.defense, t.name.clone(), t.alive))
    else {
        wander(world, actor_id, ActionState::Exploring);
        return;
    };
    if !target_alive {
        wander(world, actor_id, ActionState::Exploring);
        return;
    }
    let Some((actor_pos, actor_attack, actor_name)) = world
        .agents
        .get(&actor_id)
        .map(|a| (a.pos(), a.attack, a.name.clone()))
    else {
        return;
    };

    if let Some(agent) = world.agents.get_mut(&actor_id) {
        agent.action_state = ActionState::Fighting;
    }

    if actor_pos.manhattan(target_pos) <= 1 {
        let roll = world.rng.random_range(0..=4);
        let damage = (actor_attack - target_defense / 2 + roll).max(1);

        if let Some(actor) = world.agents.get_mut(&actor_id) {
            actor.alliances.remove(&target_id);
            actor.enemies.insert(target_id);
        }
        let killed = world.agents.get_mut(&target_id).is_some_and(|target| {
            target.alliances.remove(&actor_id);
            target.enemies.insert(actor_id);
            target.take_damage(damage, &actor_name)
        });

        world.push_event(
            EventKind::Combat,
            format!("{actor_name} hits {target_name} for {damage}"),
            vec![actor_id, target_id],
        );
        if killed {
            handle_death(world, target_id, Some(actor_id));
        }
    } else {
        move_agent_toward(world, actor_id, target_pos);
    }
}

/// Propose an alliance within range, or approach the target.
fn execute_ally(world: &mut World, actor_id: AgentId, target_id: AgentId) {
    let Some((target_pos, target_alive, target_name)) = world
        .agents
        .get(&target_id)
        .map(|t| (t.pos(), t.alive, t.name.clone()))
    else {
        wander(world, actor_id, ActionState::Exploring);
        return;
    };
    if !target_alive {
        wander(world, actor_id, ActionState::Exploring);
        return;
    }
    let Some((actor_pos, actor_name)) = world
        .agents
        .get(&actor_id)
        .map(|a| (a.pos(), a.name.clone()))
    else {
        return;
    };

    if let Some(agent) = world.agents.get_mut(&actor_id) {
        agent.action_state = ActionState::Allying;
    }

    if actor_pos.manhattan(target_pos) <= ALLY_RANGE {
        let holds_grudge = world
            .agents
            .get(&target_id)
            .is_some_and(|t| t.enemies.contains(&actor_id));
        let accepted = !holds_grudge && world.rng.random::<f64>() < ALLY_ACCEPT_CHANCE;
        if accepted {
            if let Some(actor) = world.agents.get_mut(&actor_id) {
                actor.enemies.remove(&target_id);
                actor.alliances.insert(target_id);
            }
            if let Some(target) = world.agents.get_mut(&target_id) {
                target.enemies.remove(&actor_id);
                target.alliances.insert(actor_id);
            }
            world.push_event(
                EventKind::Alliance,
                format!("{actor_name} and {target_name} join forces"),
                vec![actor_id, target_id],
            );
        }
    } else {
        move_agent_toward(world, actor_id, target_pos);
    }
}

/// Break an alliance and strike the former ally in the same breath.
fn execute_betray(world: &mut World, actor_id: AgentId, target_id: AgentId) {
    let Some((target_defense, target_alive, target_name)) = world
        .agents
        .get(&target_id)
        .map(|t| (t.defense, t.alive, t.name.clone()))
    else {
        wander(world, actor_id, ActionState::Exploring);
        return;
    };
    if !target_alive {
        wander(world, actor_id, ActionState::Exploring);
        return;
    }
    let Some((actor_attack, actor_name)) = world
        .agents
        .get(&actor_id)
        .map(|a| (a.attack, a.name.clone()))
    else {
        return;
    };

    if let Some(actor) = world.agents.get_mut(&actor_id) {
        actor.action_state = ActionState::Betraying;
        actor.alliances.remove(&target_id);
        actor.enemies.insert(target_id);
    }
    let damage = (actor_attack + BETRAYAL_BONUS - target_defense / 2).max(1);
    let killed = world.agents.get_mut(&target_id).is_some_and(|target| {
        target.alliances.remove(&actor_id);
        target.enemies.insert(actor_id);
        target.memory.add(
            format!("{actor_name} betrayed me"),
            9,
            MemoryKind::Observation,
        );
        target.take_damage(damage, &actor_name)
    });

    world.push_event(
        EventKind::Betrayal,
        format!("{actor_name} turns on {target_name} for {damage}"),
        vec![actor_id, target_id],
    );
    if killed {
        handle_death(world, target_id, Some(actor_id));
    }
}

/// Pick up an adjacent item, or approach it.
fn execute_loot(world: &mut World, actor_id: AgentId, item_id: ItemId) {
    let Some(item) = world.items.get(&item_id).copied() else {
        // Someone got there first.
        wander(world, actor_id, ActionState::Exploring);
        return;
    };
    let Some(actor_pos) = world.agents.get(&actor_id).map(skirmish_agents::Agent::pos) else {
        return;
    };

    if let Some(agent) = world.agents.get_mut(&actor_id) {
        agent.action_state = ActionState::Looting;
    }

    if actor_pos.manhattan(item.pos()) <= 1 {
        world.items.remove(&item_id);
        let mut actor_name = String::new();
        if let Some(actor) = world.agents.get_mut(&actor_id) {
            actor.attack += item.bonus;
            actor.weapon = Some(item.kind);
            actor.memory.add(
                format!("Picked up a {} (+{} attack)", item.kind, item.bonus),
                5,
                MemoryKind::Observation,
            );
            actor_name.clone_from(&actor.name);
        }
        world.push_event(
            EventKind::Loot,
            format!("{actor_name} picks up a {}", item.kind),
            vec![actor_id],
        );
    } else {
        move_agent_toward(world, actor_id, item.pos());
    }
}

/// Move away from the centroid of nearby agents (random when alone).
fn execute_flee(world: &mut World, actor_id: AgentId, ctx: &DecisionContext) {
    let World {
        agents,
        tile_map,
        rng,
        agent_paths,
        ..
    } = world;

    if let Some(agent) = agents.get_mut(&actor_id) {
        agent.action_state = ActionState::Fleeing;
        if ctx.nearby_agents.is_empty() {
            agent.move_random(tile_map, rng);
        } else {
            let count = i32::try_from(ctx.nearby_agents.len()).unwrap_or(1).max(1);
            let sum_x: i32 = ctx.nearby_agents.iter().map(|a| a.x).sum();
            let sum_y: i32 = ctx.nearby_agents.iter().map(|a| a.y).sum();
            agent.move_away_from(sum_x / count, sum_y / count, tile_map);
        }
        agent.clear_path();
    }
    agent_paths.remove(&actor_id);
}

/// Random wander used by Explore, Rest, and degenerate decisions.
fn wander(world: &mut World, actor_id: AgentId, state: ActionState) {
    let World {
        agents,
        tile_map,
        rng,
        agent_paths,
        ..
    } = world;
    if let Some(agent) = agents.get_mut(&actor_id) {
        agent.action_state = state;
        agent.move_random(tile_map, rng);
        agent.clear_path();
    }
    agent_paths.remove(&actor_id);
}

/// Pathfind toward a goal and take the first step; fall back to a direct
/// step (and drop any stale published path) when no route exists.
fn move_agent_toward(world: &mut World, actor_id: AgentId, goal: GridPos) {
    let World {
        agents,
        tile_map,
        agent_paths,
        ..
    } = world;
    let Some(agent) = agents.get_mut(&actor_id) else {
        return;
    };

    match skirmish_map::find_path(tile_map, agent.pos(), goal) {
        Some(path) if path.waypoints.len() > 1 => {
            agent.set_path(path.waypoints.clone());
            agent.follow_path(tile_map);
            agent_paths.insert(actor_id, path.waypoints);
        }
        _ => {
            agent.move_toward(goal.x, goal.y, tile_map);
            agent_paths.remove(&actor_id);
        }
    }
}

/// Bookkeeping shared by every way an agent can die.
fn handle_death(world: &mut World, victim_id: AgentId, killer_id: Option<AgentId>) {
    world.alive_count = world.alive_count.saturating_sub(1);

    let victim_name = world
        .agents
        .get(&victim_id)
        .map(|a| a.name.clone())
        .unwrap_or_default();

    let killer_name = killer_id.and_then(|id| {
        let killer = world.agents.get_mut(&id)?;
        killer.kill_count = killer.kill_count.saturating_add(1);
        Some(killer.name.clone())
    });

    // A dead agent leaves every alliance.
    for agent in world.agents.values_mut() {
        agent.alliances.remove(&victim_id);
    }
    world.agent_paths.remove(&victim_id);

    let message = killer_name.as_ref().map_or_else(
        || format!("{victim_name} is claimed by the zone"),
        |killer| format!("{killer} eliminates {victim_name}"),
    );
    let agent_ids = killer_id
        .map(|k| vec![k, victim_id])
        .unwrap_or_else(|| vec![victim_id]);
    world.push_event(EventKind::Kill, message, agent_ids);
    info!(victim = %victim_name, "agent died");
}

// ---------------------------------------------------------------------------
// Step 5b: reflection
// ---------------------------------------------------------------------------

/// Periodic reflection pass; results land as importance-7 memories.
async fn reflect_step(world: &mut World, backend: &DecisionBackend) {
    let contexts: Vec<ReflectContext> = world
        .agents
        .values()
        .filter(|a| a.alive)
        .map(|agent| ReflectContext {
            agent_id: agent.id,
            name: agent.name.clone(),
            personality: agent.personality.clone(),
            hp: agent.hp,
            max_hp: agent.max_hp,
            recent_memories: agent
                .memory
                .recent(REFLECT_MEMORY_COUNT)
                .iter()
                .map(|e| e.text.clone())
                .collect(),
        })
        .collect();

    let reflections = join_all(contexts.iter().map(|ctx| backend.reflect(ctx))).await;

    for (ctx, reflection) in contexts.iter().zip(reflections) {
        if let Some(text) = reflection
            && let Some(agent) = world.agents.get_mut(&ctx.agent_id)
        {
            agent
                .memory
                .add(text, REFLECTION_IMPORTANCE, MemoryKind::Reflection);
        }
    }
}

// ---------------------------------------------------------------------------
// Step 6: win check
// ---------------------------------------------------------------------------

/// Finish the match when at most one agent remains.
fn win_check(world: &mut World) {
    if world.phase != GamePhase::Running || world.alive_count > 1 {
        return;
    }
    world.phase = GamePhase::Finished;
    world.winner = world.agents.values().find(|a| a.alive).map(|a| a.id);

    let message = world
        .winner
        .and_then(|id| world.agents.get(&id))
        .map_or_else(
            || String::from("The zone outlasted them all; no one wins"),
            |w| format!("{} is the last one standing", w.name),
        );
    let ids = world.winner.map(|id| vec![id]).unwrap_or_default();
    world.push_event(EventKind::GameOver, message, ids);
    info!(winner = ?world.winner, "match finished");
}
