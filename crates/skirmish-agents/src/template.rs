//! Agent templates: the built-in roster of combatants.
//!
//! A template fixes a name, a personality keyword (which drives the
//! rule-based decision branch), a flavor description, and base stats.
//! Instances jitter the stats slightly at spawn so two agents from the
//! same template are never identical.

use rand::Rng;

/// Base combat stats before per-instance jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStats {
    /// Hit point ceiling.
    pub hp: i32,
    /// Attack stat.
    pub attack: i32,
    /// Defense stat.
    pub defense: i32,
}

/// A reusable agent blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTemplate {
    /// Display name.
    pub name: &'static str,
    /// Personality keyword consumed by the decision backend.
    pub personality: &'static str,
    /// Flavor description shown to spectators.
    pub description: &'static str,
    /// Base stats before jitter.
    pub base_stats: BaseStats,
}

/// Maximum absolute hp jitter applied at spawn.
const HP_JITTER: i32 = 10;

/// Maximum absolute attack jitter applied at spawn.
const ATTACK_JITTER: i32 = 3;

/// Maximum absolute defense jitter applied at spawn.
const DEFENSE_JITTER: i32 = 2;

impl AgentTemplate {
    /// Base stats with a small random offset, floored so no stat drops
    /// below 1 hp / 1 attack / 0 defense.
    pub fn jittered_stats(&self, rng: &mut impl Rng) -> BaseStats {
        BaseStats {
            hp: (self.base_stats.hp + rng.random_range(-HP_JITTER..=HP_JITTER)).max(1),
            attack: (self.base_stats.attack + rng.random_range(-ATTACK_JITTER..=ATTACK_JITTER))
                .max(1),
            defense: (self.base_stats.defense
                + rng.random_range(-DEFENSE_JITTER..=DEFENSE_JITTER))
            .max(0),
        }
    }
}

/// The built-in roster, cycled through when spawning agents.
pub const ROSTER: &[AgentTemplate] = &[
    AgentTemplate {
        name: "Vex",
        personality: "aggressive",
        description: "A brawler who solves every problem with the same tool.",
        base_stats: BaseStats { hp: 100, attack: 14, defense: 4 },
    },
    AgentTemplate {
        name: "Mara",
        personality: "cautious",
        description: "Counts exits before entering a room.",
        base_stats: BaseStats { hp: 110, attack: 9, defense: 8 },
    },
    AgentTemplate {
        name: "Korrin",
        personality: "treacherous",
        description: "Every handshake is an opening move.",
        base_stats: BaseStats { hp: 95, attack: 12, defense: 5 },
    },
    AgentTemplate {
        name: "Sable",
        personality: "strategic",
        description: "Plays the map, not the opponent.",
        base_stats: BaseStats { hp: 100, attack: 10, defense: 7 },
    },
    AgentTemplate {
        name: "Bram",
        personality: "brave",
        description: "Has never once retreated on purpose.",
        base_stats: BaseStats { hp: 120, attack: 12, defense: 6 },
    },
    AgentTemplate {
        name: "Isolde",
        personality: "loyal",
        description: "Keeps her word longer than is wise here.",
        base_stats: BaseStats { hp: 105, attack: 10, defense: 7 },
    },
    AgentTemplate {
        name: "Fenn",
        personality: "cunning",
        description: "Wins fights that never visibly happen.",
        base_stats: BaseStats { hp: 90, attack: 13, defense: 4 },
    },
    AgentTemplate {
        name: "Odo",
        personality: "resourceful",
        description: "Treats the arena as a supply run.",
        base_stats: BaseStats { hp: 100, attack: 9, defense: 6 },
    },
    AgentTemplate {
        name: "Rask",
        personality: "impulsive",
        description: "Decides mid-swing.",
        base_stats: BaseStats { hp: 95, attack: 15, defense: 3 },
    },
    AgentTemplate {
        name: "Nyra",
        personality: "strategic",
        description: "Waits for the zone to do the work.",
        base_stats: BaseStats { hp: 100, attack: 11, defense: 6 },
    },
];

/// Fallback template; unreachable in practice since the roster is a
/// non-empty constant, but keeps the lookup total.
const FALLBACK: AgentTemplate = AgentTemplate {
    name: "Drifter",
    personality: "cautious",
    description: "Appeared from nowhere in particular.",
    base_stats: BaseStats { hp: 100, attack: 10, defense: 5 },
};

/// Template for the `index`-th spawned agent, cycling the roster.
pub fn roster_template(index: usize) -> &'static AgentTemplate {
    let len = ROSTER.len().max(1);
    ROSTER.get(index % len).unwrap_or(&FALLBACK)
}
