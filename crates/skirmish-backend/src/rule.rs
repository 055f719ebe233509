//! Rule-based decision engine.
//!
//! The default backend and the fallback for the LLM variant. Rules are
//! evaluated in strict priority order; the first match wins:
//!
//! 1. A fresh inner voice that parses to an intent (attack/flee/ally,
//!    with an optional name match among nearby agents)
//! 2. Loot the nearest visible item
//! 3. Flee when below 30% hp with agents nearby
//! 4. Personality-driven branch
//! 5. Explore
//!
//! Decisions are resolved in microseconds and never fail, which is what
//! makes this engine a safe fallback for a slow or broken remote.

use chrono::Utc;
use rand::Rng;
use skirmish_types::{
    Decision, DecisionContext, DecisionType, NearbyAgent, ReflectContext, ThinkingProcess,
};
use tracing::debug;

// ---------------------------------------------------------------------------
// Thresholds (kept as constants so operators can find and tune them)
// ---------------------------------------------------------------------------

/// Fraction of max hp (in tenths) below which fleeing takes priority.
const FLEE_HP_TENTHS: i32 = 3;

/// Fraction of max hp (in tenths) below which reflection turns to survival.
const SURVIVAL_HP_TENTHS: i32 = 4;

/// Ally hp below which a treacherous agent considers betrayal.
const BETRAYAL_TARGET_HP: i32 = 40;

/// Percent chance a treacherous agent betrays a weakened ally.
const BETRAYAL_CHANCE_PCT: u32 = 20;

/// Combat mentions among recent memories that trigger a combat reflection.
const COMBAT_MENTIONS: usize = 3;

/// Alliance mentions among recent memories that trigger an alliance
/// reflection.
const ALLIANCE_MENTIONS: usize = 2;

/// The rule-based decision backend.
///
/// Stateless; all randomness comes from the process RNG, so concurrent
/// calls are safe.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBackend;

impl RuleBackend {
    /// Create a rule backend.
    pub const fn new() -> Self {
        Self
    }

    /// Decide one agent's action for this tick.
    pub fn decide(&self, ctx: &DecisionContext) -> Decision {
        let mut decision = self.pick(ctx);
        decision.thinking = Some(make_thinking(&decision));
        decision
    }

    /// Rule evaluation without the thinking artifact attached.
    fn pick(&self, ctx: &DecisionContext) -> Decision {
        // Rule 1: a fresh spectator instruction wins.
        if let Some(voice) = ctx.inner_voice.as_deref()
            && let Some(decision) = parse_inner_voice(voice, ctx)
        {
            debug!(agent = %ctx.name, voice, "rule engine: obeying inner voice");
            return decision;
        }

        // Rule 2: free gear is free gear.
        if let Some(item) = ctx.nearby_items.first() {
            return Decision::loot(item.id, format!("a {} is lying right there", item.kind));
        }

        // Rule 3: low hp with company means leave.
        if ctx.hp * 10 < ctx.max_hp * FLEE_HP_TENTHS && !ctx.nearby_agents.is_empty() {
            return Decision::of(DecisionType::Flee).with_reason("too hurt to risk a fight");
        }

        // Rule 4: personality branch.
        if let Some(decision) = personality_decision(ctx) {
            return decision;
        }

        // Rule 5: nothing pressing.
        Decision::of(DecisionType::Explore).with_reason("scouting the arena")
    }

    /// Periodic reflection over recent memories.
    ///
    /// Returns `None` when nothing stands out.
    pub fn reflect(&self, ctx: &ReflectContext) -> Option<String> {
        let mentions = |words: &[&str]| {
            ctx.recent_memories
                .iter()
                .filter(|m| {
                    let lower = m.to_lowercase();
                    words.iter().any(|w| lower.contains(w))
                })
                .count()
        };

        if mentions(&["damage", "attack"]) >= COMBAT_MENTIONS {
            return Some(format!(
                "{} has been in the thick of it; the fights are finding me whether I pick them or not.",
                ctx.name
            ));
        }
        if mentions(&["alliance", "ally", "allied"]) >= ALLIANCE_MENTIONS {
            return Some(String::from(
                "The pacts I have made are carrying me further than my own blade.",
            ));
        }
        if ctx.hp * 10 < ctx.max_hp * SURVIVAL_HP_TENTHS {
            return Some(String::from(
                "I am running out of blood to spend; staying alive has to come first now.",
            ));
        }
        None
    }
}

/// Interpret a spectator instruction, matching an optional target name
/// among nearby agents. Unusable instructions return `None` so the
/// normal rules apply.
fn parse_inner_voice(voice: &str, ctx: &DecisionContext) -> Option<Decision> {
    let lower = voice.to_lowercase();

    let named_target = |filter: &dyn Fn(&NearbyAgent) -> bool| {
        ctx.nearby_agents
            .iter()
            .find(|a| filter(a) && lower.contains(&a.name.to_lowercase()))
            .or_else(|| ctx.nearby_agents.iter().find(|a| filter(a)))
    };

    if lower.contains("flee") || lower.contains("run") {
        return Some(Decision::of(DecisionType::Flee).with_reason("the voices say run"));
    }
    if lower.contains("attack") || lower.contains("fight") || lower.contains("kill") {
        return named_target(&|a| !a.is_ally)
            .map(|a| Decision::against(DecisionType::Attack, a.id, "the voices demand blood"));
    }
    if lower.contains("ally") || lower.contains("friend") {
        return named_target(&|a| !a.is_ally && !a.is_enemy)
            .map(|a| Decision::against(DecisionType::Ally, a.id, "the voices counsel friendship"));
    }
    None
}

/// The personality-driven branch of the rule engine.
fn personality_decision(ctx: &DecisionContext) -> Option<Decision> {
    let allies: Vec<&NearbyAgent> = ctx.nearby_agents.iter().filter(|a| a.is_ally).collect();
    let hostiles: Vec<&NearbyAgent> = ctx.nearby_agents.iter().filter(|a| a.is_enemy).collect();
    let neutrals: Vec<&NearbyAgent> = ctx
        .nearby_agents
        .iter()
        .filter(|a| !a.is_ally && !a.is_enemy)
        .collect();

    match ctx.personality.as_str() {
        "aggressive" | "brave" | "impulsive" => weakest(ctx.nearby_agents.iter().filter(|a| !a.is_ally))
            .map(|a| Decision::against(DecisionType::Attack, a.id, "the weak go first")),

        "cautious" | "strategic" | "loyal" => {
            if hostiles.len() > allies.len()
                && let Some(neutral) = neutrals.first()
            {
                return Some(Decision::against(
                    DecisionType::Ally,
                    neutral.id,
                    "outnumbered; better to make friends",
                ));
            }
            if !hostiles.is_empty() && allies.len().saturating_add(1) > hostiles.len() {
                return weakest(hostiles.iter().copied())
                    .map(|a| Decision::against(DecisionType::Attack, a.id, "numbers are on my side"));
            }
            None
        }

        "treacherous" | "cunning" => {
            let weakened_ally = allies.iter().find(|a| a.hp < BETRAYAL_TARGET_HP);
            if let Some(ally) = weakened_ally
                && rand::rng().random_range(0..100) < BETRAYAL_CHANCE_PCT
            {
                return Some(Decision::against(
                    DecisionType::Betray,
                    ally.id,
                    "a wounded ally is just loot that walks",
                ));
            }
            weakest(neutrals.iter().copied())
                .map(|a| Decision::against(DecisionType::Attack, a.id, "strangers make easy marks"))
        }

        "resourceful" => neutrals.first().map(|a| {
            Decision::against(DecisionType::Ally, a.id, "every pair of hands is an asset")
        }),

        _ => None,
    }
}

/// The lowest-hp agent in an iterator, ties broken by id for determinism.
fn weakest<'a>(agents: impl Iterator<Item = &'a NearbyAgent>) -> Option<&'a NearbyAgent> {
    agents.min_by(|a, b| a.hp.cmp(&b.hp).then(a.id.cmp(&b.id)))
}

/// Build the thinking artifact recorded for a rule decision.
fn make_thinking(decision: &Decision) -> ThinkingProcess {
    ThinkingProcess {
        action: format!("{:?}", decision.kind),
        reasoning: decision
            .reason
            .clone()
            .unwrap_or_else(|| String::from("instinct")),
        prompt: None,
        raw_response: None,
        timestamp: Utc::now(),
    }
}
