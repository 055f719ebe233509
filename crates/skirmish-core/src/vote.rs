//! Windowed spectator vote aggregation.
//!
//! Votes accumulate in a fixed-length window. Within a window each
//! `(agent, player)` pair holds at most one vote: a newer submission
//! from the same player overwrites the older one in place, so double
//! submission is idempotent. When the window elapses, the most-voted
//! action per agent wins (ties break by the first-seen insertion order
//! of actions) and a fresh window opens.
//!
//! Resolution is returned from [`VoteManager::tick`]; the caller -- the
//! world -- is the resolver and turns winners into inner voices.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use skirmish_types::{ActionCount, AgentId, PlayerId, VoteStateView};
use tracing::debug;

/// One spectator vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    /// The agent being voted on.
    pub agent_id: AgentId,
    /// The suggested action text.
    pub action: String,
    /// The submitting player.
    pub player_id: PlayerId,
}

/// Per-agent resolved winners of one window.
pub type VoteResolution = BTreeMap<AgentId, String>;

/// Collects votes into timed windows and resolves winners.
#[derive(Debug)]
pub struct VoteManager {
    window_id: u64,
    window_start: Instant,
    window_duration: Duration,
    /// Per-agent ballots in submission order: `(player, action)`.
    ballots: BTreeMap<AgentId, Vec<(PlayerId, String)>>,
}

impl VoteManager {
    /// Create a manager with the given window length.
    pub fn new(window_duration: Duration) -> Self {
        Self {
            window_id: 0,
            window_start: Instant::now(),
            window_duration,
            ballots: BTreeMap::new(),
        }
    }

    /// The identifier of the currently open window.
    pub const fn window_id(&self) -> u64 {
        self.window_id
    }

    /// Record a vote, replacing this player's earlier vote for the same
    /// agent if one exists.
    pub fn submit(&mut self, vote: Vote) {
        let ballot = self.ballots.entry(vote.agent_id).or_default();
        if let Some(slot) = ballot.iter_mut().find(|(player, _)| *player == vote.player_id) {
            slot.1 = vote.action;
        } else {
            ballot.push((vote.player_id, vote.action));
        }
    }

    /// Resolve the window if its duration has elapsed.
    ///
    /// On resolution the winners per agent are returned, the window id
    /// advances, and the ballots clear. Returns `None` while the window
    /// is still open.
    pub fn tick(&mut self) -> Option<VoteResolution> {
        self.tick_at(Instant::now())
    }

    /// [`tick`](Self::tick) against an explicit clock, for tests.
    pub fn tick_at(&mut self, now: Instant) -> Option<VoteResolution> {
        if now.duration_since(self.window_start) < self.window_duration {
            return None;
        }

        let mut resolution = VoteResolution::new();
        for (&agent_id, ballot) in &self.ballots {
            if let Some(winner) = winning_action(ballot) {
                resolution.insert(agent_id, winner);
            }
        }

        debug!(
            window_id = self.window_id,
            agents = resolution.len(),
            "voting window resolved"
        );

        self.window_id = self.window_id.wrapping_add(1);
        self.window_start = now;
        self.ballots.clear();
        Some(resolution)
    }

    /// The published view of the open window.
    pub fn state(&self) -> VoteStateView {
        self.state_at(Instant::now())
    }

    /// [`state`](Self::state) against an explicit clock, for tests.
    pub fn state_at(&self, now: Instant) -> VoteStateView {
        let elapsed = now.duration_since(self.window_start);
        let remaining = self.window_duration.saturating_sub(elapsed);

        let agent_votes = self
            .ballots
            .iter()
            .map(|(&agent_id, ballot)| (agent_id, ranked_counts(ballot)))
            .collect();

        VoteStateView {
            window_id: self.window_id,
            time_remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            agent_votes,
        }
    }
}

/// Tally a ballot preserving the first-seen order of actions.
fn tally(ballot: &[(PlayerId, String)]) -> Vec<(String, u32)> {
    let mut counts: Vec<(String, u32)> = Vec::new();
    for (_, action) in ballot {
        if let Some(slot) = counts.iter_mut().find(|(a, _)| a == action) {
            slot.1 = slot.1.saturating_add(1);
        } else {
            counts.push((action.clone(), 1));
        }
    }
    counts
}

/// The most-voted action; ties keep the first-seen action.
fn winning_action(ballot: &[(PlayerId, String)]) -> Option<String> {
    let counts = tally(ballot);
    let mut best: Option<(String, u32)> = None;
    for (action, count) in counts {
        match &best {
            Some((_, best_count)) if count <= *best_count => {}
            _ => best = Some((action, count)),
        }
    }
    best.map(|(action, _)| action)
}

/// Ranked `(action, count)` pairs, descending by count; equal counts
/// keep their first-seen order (the sort is stable).
fn ranked_counts(ballot: &[(PlayerId, String)]) -> Vec<ActionCount> {
    let mut counts = tally(ballot);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(action, count)| ActionCount { action, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(agent: AgentId, player: PlayerId, action: &str) -> Vote {
        Vote {
            agent_id: agent,
            action: action.to_owned(),
            player_id: player,
        }
    }

    fn resolved_after(manager: &mut VoteManager, window: Duration) -> VoteResolution {
        let later = Instant::now() + window + Duration::from_millis(1);
        manager.tick_at(later).unwrap_or_default()
    }

    #[test]
    fn window_does_not_resolve_early() {
        let mut manager = VoteManager::new(Duration::from_secs(30));
        manager.submit(vote(AgentId::new(), PlayerId::new(), "flee"));
        assert!(manager.tick_at(Instant::now()).is_none());
        assert_eq!(manager.window_id(), 0);
    }

    #[test]
    fn majority_wins_and_window_rotates() {
        let window = Duration::from_millis(1000);
        let mut manager = VoteManager::new(window);
        let agent = AgentId::new();

        for _ in 0..3 {
            manager.submit(vote(agent, PlayerId::new(), "attack X"));
        }
        for _ in 0..2 {
            manager.submit(vote(agent, PlayerId::new(), "flee"));
        }

        let state = manager.state_at(Instant::now());
        let ranked = state.agent_votes.get(&agent).cloned().unwrap_or_default();
        assert_eq!(
            ranked,
            vec![
                ActionCount { action: String::from("attack X"), count: 3 },
                ActionCount { action: String::from("flee"), count: 2 },
            ]
        );

        let resolution = resolved_after(&mut manager, window);
        assert_eq!(resolution.get(&agent).map(String::as_str), Some("attack X"));
        assert_eq!(manager.window_id(), 1);

        // Ballots cleared: the next window resolves to nothing.
        let next = resolved_after(&mut manager, window);
        assert!(next.is_empty());
    }

    #[test]
    fn agent_without_votes_is_absent_from_resolution() {
        let window = Duration::from_millis(100);
        let mut manager = VoteManager::new(window);
        let voted = AgentId::new();
        let silent = AgentId::new();
        manager.submit(vote(voted, PlayerId::new(), "rest"));

        let resolution = resolved_after(&mut manager, window);
        assert!(resolution.contains_key(&voted));
        assert!(!resolution.contains_key(&silent));
    }

    #[test]
    fn resubmission_is_idempotent_per_player() {
        let window = Duration::from_millis(100);
        let mut manager = VoteManager::new(window);
        let agent = AgentId::new();
        let player = PlayerId::new();

        manager.submit(vote(agent, player, "attack X"));
        manager.submit(vote(agent, player, "attack X"));
        manager.submit(vote(agent, PlayerId::new(), "flee"));

        let state = manager.state_at(Instant::now());
        let ranked = state.agent_votes.get(&agent).cloned().unwrap_or_default();
        // The duplicate submission counts once.
        assert_eq!(ranked.first().map(|c| c.count), Some(1));

        let resolution = resolved_after(&mut manager, window);
        // Tie between "attack X" and "flee": first-seen wins.
        assert_eq!(resolution.get(&agent).map(String::as_str), Some("attack X"));
    }

    #[test]
    fn overwrite_replaces_previous_vote() {
        let window = Duration::from_millis(100);
        let mut manager = VoteManager::new(window);
        let agent = AgentId::new();
        let player = PlayerId::new();

        manager.submit(vote(agent, player, "attack X"));
        manager.submit(vote(agent, player, "flee"));
        manager.submit(vote(agent, PlayerId::new(), "flee"));

        let resolution = resolved_after(&mut manager, window);
        assert_eq!(resolution.get(&agent).map(String::as_str), Some("flee"));
    }

    #[test]
    fn tie_break_is_first_seen_insertion_order() {
        let window = Duration::from_millis(100);
        let mut manager = VoteManager::new(window);
        let agent = AgentId::new();

        manager.submit(vote(agent, PlayerId::new(), "rest"));
        manager.submit(vote(agent, PlayerId::new(), "attack X"));

        let resolution = resolved_after(&mut manager, window);
        assert_eq!(resolution.get(&agent).map(String::as_str), Some("rest"));
    }

    #[test]
    fn state_reports_remaining_time() {
        let manager = VoteManager::new(Duration::from_secs(30));
        let state = manager.state_at(Instant::now());
        assert!(state.time_remaining_ms <= 30_000);
        assert!(state.time_remaining_ms > 29_000);
        assert_eq!(state.window_id, 0);
    }
}
