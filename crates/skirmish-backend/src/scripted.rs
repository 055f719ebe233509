//! Scripted decision backend for tests and headless drills.
//!
//! Returns pre-programmed decisions per agent, which lets the tick cycle
//! be exercised end-to-end without an LLM or the rule engine in the way.
//! Unscripted agents rest.

use std::collections::BTreeMap;

use skirmish_types::{AgentId, Decision, DecisionContext, DecisionType, ReflectContext};

/// A backend that replays a fixed decision per agent.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    decisions: BTreeMap<AgentId, Decision>,
}

impl ScriptedBackend {
    /// Create an empty script (every agent rests).
    pub const fn new() -> Self {
        Self {
            decisions: BTreeMap::new(),
        }
    }

    /// Program the decision one agent will make every tick.
    #[must_use]
    pub fn with(mut self, agent_id: AgentId, decision: Decision) -> Self {
        self.decisions.insert(agent_id, decision);
        self
    }

    /// Replace the scripted decision for one agent.
    pub fn script(&mut self, agent_id: AgentId, decision: Decision) {
        self.decisions.insert(agent_id, decision);
    }

    /// The scripted decision for this agent, or Rest.
    pub fn decide(&self, ctx: &DecisionContext) -> Decision {
        self.decisions
            .get(&ctx.agent_id)
            .cloned()
            .unwrap_or_else(|| Decision::of(DecisionType::Rest))
    }

    /// Scripted backends never reflect.
    pub fn reflect(&self, _ctx: &ReflectContext) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use skirmish_types::{GridPos, WorldContext};

    use super::*;

    fn ctx_for(agent_id: AgentId) -> DecisionContext {
        DecisionContext {
            agent_id,
            name: String::from("Tester"),
            personality: String::from("cautious"),
            hp: 100,
            max_hp: 100,
            attack: 10,
            defense: 5,
            pos: GridPos::new(0, 0),
            nearby_agents: Vec::new(),
            nearby_items: Vec::new(),
            recent_memories: Vec::new(),
            inner_voice: None,
            world: WorldContext {
                tick: 1,
                alive_count: 2,
                shrink_border: 20,
                zone_center: GridPos::new(10, 10),
            },
        }
    }

    #[test]
    fn scripted_agent_gets_its_decision() {
        let id = AgentId::new();
        let backend = ScriptedBackend::new().with(id, Decision::of(DecisionType::Flee));
        assert_eq!(backend.decide(&ctx_for(id)).kind, DecisionType::Flee);
    }

    #[test]
    fn unscripted_agent_rests() {
        let backend = ScriptedBackend::new();
        assert_eq!(backend.decide(&ctx_for(AgentId::new())).kind, DecisionType::Rest);
        assert!(backend.reflect(&ReflectContext {
            agent_id: AgentId::new(),
            name: String::new(),
            personality: String::new(),
            hp: 1,
            max_hp: 100,
            recent_memories: Vec::new(),
        }).is_none());
    }
}
