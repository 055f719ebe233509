//! LLM response parsing into typed decisions.
//!
//! The LLM is asked to answer with
//!
//! ```text
//! ACTION: <verb> [target or item]
//! REASON: <text>
//! ```
//!
//! Parsing is tolerant: verb matching is case-insensitive, targets are
//! matched by substring against nearby agent names (or item kind names
//! for loot), and an unrecognized verb degrades to Explore rather than
//! failing. Only a response with no `ACTION:` line at all is an error,
//! which the caller converts into a rule-based fallback.

use skirmish_types::{Decision, DecisionContext, DecisionType, NearbyAgent};
use tracing::warn;

use crate::error::BackendError;

/// Parse a raw LLM response into a [`Decision`] for the given context.
///
/// # Errors
///
/// Returns [`BackendError::Parse`] when the response contains no
/// `ACTION:` line.
pub fn parse_action_response(raw: &str, ctx: &DecisionContext) -> Result<Decision, BackendError> {
    let action_line = find_tagged_line(raw, "ACTION:")
        .ok_or_else(|| BackendError::Parse(format!("no ACTION line in: {}", raw.trim())))?;
    let reason = find_tagged_line(raw, "REASON:").unwrap_or_default();

    let mut words = action_line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_lowercase();
    let target_text = words.collect::<Vec<_>>().join(" ");

    let decision = match verb.trim_end_matches(['.', ',', '!']) {
        "attack" | "fight" | "strike" => attack_decision(ctx, &target_text, &reason),
        "flee" | "run" | "retreat" => Decision::of(DecisionType::Flee).with_reason(&reason),
        "ally" | "befriend" => ally_decision(ctx, &target_text, &reason),
        "betray" => betray_decision(ctx, &target_text, &reason),
        "loot" | "grab" | "pick" => loot_decision(ctx, &target_text, &reason),
        "rest" | "wait" | "hide" => Decision::of(DecisionType::Rest).with_reason(&reason),
        "explore" | "move" | "wander" | "search" => {
            Decision::of(DecisionType::Explore).with_reason(&reason)
        }
        other => {
            warn!(verb = other, "unrecognized action verb, exploring instead");
            Decision::of(DecisionType::Explore).with_reason(&reason)
        }
    };

    Ok(decision)
}

/// The text following `tag` on the first line that carries it,
/// case-insensitive.
fn find_tagged_line(raw: &str, tag: &str) -> Option<String> {
    let tag_lower = tag.to_lowercase();
    raw.lines().find_map(|line| {
        let trimmed = line.trim();
        if trimmed.to_lowercase().starts_with(&tag_lower) {
            Some(trimmed.get(tag.len()..).unwrap_or_default().trim().to_owned())
        } else {
            None
        }
    })
}

/// Nearby agent whose name contains (or is contained in) `target`,
/// case-insensitive.
fn match_agent<'a>(
    nearby: &'a [NearbyAgent],
    target: &str,
    filter: impl Fn(&NearbyAgent) -> bool,
) -> Option<&'a NearbyAgent> {
    let target_lower = target.trim().to_lowercase();
    if target_lower.is_empty() {
        return nearby.iter().find(|a| filter(a));
    }
    nearby
        .iter()
        .find(|a| {
            let name = a.name.to_lowercase();
            filter(a) && (target_lower.contains(&name) || name.contains(&target_lower))
        })
        .or_else(|| nearby.iter().find(|a| filter(a)))
}

/// Build an attack decision; falls back to Explore with no viable target.
fn attack_decision(ctx: &DecisionContext, target: &str, reason: &str) -> Decision {
    match_agent(&ctx.nearby_agents, target, |a| !a.is_ally).map_or_else(
        || Decision::of(DecisionType::Explore).with_reason("no one in reach to attack"),
        |a| Decision::against(DecisionType::Attack, a.id, reason),
    )
}

/// Build an ally decision; falls back to Explore with no viable target.
fn ally_decision(ctx: &DecisionContext, target: &str, reason: &str) -> Decision {
    match_agent(&ctx.nearby_agents, target, |a| !a.is_ally && !a.is_enemy).map_or_else(
        || Decision::of(DecisionType::Explore).with_reason("no one nearby to ally with"),
        |a| Decision::against(DecisionType::Ally, a.id, reason),
    )
}

/// Build a betray decision; falls back to Explore with no ally nearby.
fn betray_decision(ctx: &DecisionContext, target: &str, reason: &str) -> Decision {
    match_agent(&ctx.nearby_agents, target, |a| a.is_ally).map_or_else(
        || Decision::of(DecisionType::Explore).with_reason("no ally nearby to betray"),
        |a| Decision::against(DecisionType::Betray, a.id, reason),
    )
}

/// Build a loot decision; falls back to Explore with nothing in sight.
fn loot_decision(ctx: &DecisionContext, target: &str, reason: &str) -> Decision {
    let target_lower = target.trim().to_lowercase();
    let matched = ctx
        .nearby_items
        .iter()
        .find(|i| !target_lower.is_empty() && target_lower.contains(i.kind.name()))
        .or_else(|| ctx.nearby_items.first());
    matched.map_or_else(
        || Decision::of(DecisionType::Explore).with_reason("nothing worth picking up"),
        |i| Decision::loot(i.id, reason),
    )
}

#[cfg(test)]
mod tests {
    use skirmish_types::{AgentId, GridPos, ItemId, ItemKind, NearbyItem, WorldContext};

    use super::*;

    fn make_context() -> DecisionContext {
        DecisionContext {
            agent_id: AgentId::new(),
            name: String::from("Vex"),
            personality: String::from("aggressive"),
            hp: 80,
            max_hp: 100,
            attack: 12,
            defense: 4,
            pos: GridPos::new(0, 0),
            nearby_agents: vec![
                NearbyAgent {
                    id: AgentId::new(),
                    name: String::from("Mara"),
                    hp: 60,
                    max_hp: 110,
                    x: 1,
                    y: 0,
                    distance: 1,
                    is_ally: false,
                    is_enemy: false,
                },
                NearbyAgent {
                    id: AgentId::new(),
                    name: String::from("Korrin"),
                    hp: 40,
                    max_hp: 95,
                    x: 0,
                    y: 2,
                    distance: 2,
                    is_ally: true,
                    is_enemy: false,
                },
            ],
            nearby_items: vec![NearbyItem {
                id: ItemId(5),
                kind: ItemKind::Axe,
                x: 2,
                y: 2,
                distance: 4,
            }],
            recent_memories: Vec::new(),
            inner_voice: None,
            world: WorldContext {
                tick: 1,
                alive_count: 5,
                shrink_border: 20,
                zone_center: GridPos::new(10, 10),
            },
        }
    }

    fn target_of(ctx: &DecisionContext, name: &str) -> Option<AgentId> {
        ctx.nearby_agents.iter().find(|a| a.name == name).map(|a| a.id)
    }

    #[test]
    fn parses_attack_with_named_target() {
        let ctx = make_context();
        let d = parse_action_response("ACTION: attack Mara\nREASON: she is weak", &ctx);
        let d = d.unwrap_or(Decision::of(DecisionType::Rest));
        assert_eq!(d.kind, DecisionType::Attack);
        assert_eq!(d.target_agent, target_of(&ctx, "Mara"));
        assert_eq!(d.reason.as_deref(), Some("she is weak"));
    }

    #[test]
    fn verb_matching_is_case_insensitive() {
        let ctx = make_context();
        let d = parse_action_response("action: FLEE\nreason: too risky", &ctx);
        assert_eq!(d.map(|d| d.kind).ok(), Some(DecisionType::Flee));
    }

    #[test]
    fn attack_avoids_allies_when_unnamed() {
        let ctx = make_context();
        let d = parse_action_response("ACTION: attack\nREASON: anyone will do", &ctx);
        let d = d.unwrap_or(Decision::of(DecisionType::Rest));
        // Korrin is an ally; the unnamed attack resolves to Mara.
        assert_eq!(d.target_agent, target_of(&ctx, "Mara"));
    }

    #[test]
    fn betray_targets_an_ally() {
        let ctx = make_context();
        let d = parse_action_response("ACTION: betray Korrin\nREASON: opportunity", &ctx);
        let d = d.unwrap_or(Decision::of(DecisionType::Rest));
        assert_eq!(d.kind, DecisionType::Betray);
        assert_eq!(d.target_agent, target_of(&ctx, "Korrin"));
    }

    #[test]
    fn loot_matches_item_kind_substring() {
        let ctx = make_context();
        let d = parse_action_response("ACTION: loot the axe\nREASON: need an edge", &ctx);
        let d = d.unwrap_or(Decision::of(DecisionType::Rest));
        assert_eq!(d.kind, DecisionType::Loot);
        assert_eq!(d.target_item, Some(ItemId(5)));
    }

    #[test]
    fn unknown_verb_degrades_to_explore() {
        let ctx = make_context();
        let d = parse_action_response("ACTION: yodel loudly\nREASON: morale", &ctx);
        let d = d.unwrap_or(Decision::of(DecisionType::Rest));
        assert_eq!(d.kind, DecisionType::Explore);
        assert_eq!(d.reason.as_deref(), Some("morale"));
    }

    #[test]
    fn missing_action_line_is_an_error() {
        let ctx = make_context();
        let result = parse_action_response("I think I shall wander.", &ctx);
        assert!(result.is_err());
    }

    #[test]
    fn attack_with_no_targets_explores() {
        let mut ctx = make_context();
        ctx.nearby_agents.clear();
        let d = parse_action_response("ACTION: attack Mara\nREASON: ghosts", &ctx);
        assert_eq!(d.map(|d| d.kind).ok(), Some(DecisionType::Explore));
    }

    #[test]
    fn extra_prose_around_lines_is_tolerated() {
        let ctx = make_context();
        let raw = "Let me think...\n  ACTION: rest\n  REASON: conserving strength\nGood luck!";
        let d = parse_action_response(raw, &ctx);
        let d = d.unwrap_or(Decision::of(DecisionType::Explore));
        assert_eq!(d.kind, DecisionType::Rest);
        assert_eq!(d.reason.as_deref(), Some("conserving strength"));
    }
}
