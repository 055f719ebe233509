//! Per-agent memory stream with scored retrieval.
//!
//! Each agent holds a bounded stream of [`MemoryEntry`] values. When the
//! stream overflows, the least important entries are dropped (the stream
//! keeps the top 80 by importance). Retrieval scores every entry by a
//! weighted blend of recency, importance, and query relevance:
//!
//! ```text
//! score = 0.3 * recency + 0.4 * importance/10 + 0.3 * relevance
//! recency = 0.995 ^ age_seconds
//! ```
//!
//! The relevance function is a pure `(text, query) -> [0, 1]` seam; the
//! default counts matched query words, and callers may substitute an
//! embedding similarity without touching anything else.

use chrono::Utc;
use skirmish_types::{MemoryEntry, MemoryKind};

/// Maximum entries held before the stream compacts.
pub const MAX_MEMORIES: usize = 100;

/// Per-second decay factor for the recency term.
pub const RECENCY_DECAY: f64 = 0.995;

/// Entries kept after an overflow compaction (80% of the cap).
const RETAIN_ON_OVERFLOW: usize = MAX_MEMORIES * 8 / 10;

/// Weight of the recency term in the retrieval score.
const W_RECENCY: f64 = 0.3;

/// Weight of the importance term in the retrieval score.
const W_IMPORTANCE: f64 = 0.4;

/// Weight of the relevance term in the retrieval score.
const W_RELEVANCE: f64 = 0.3;

/// Fraction of query words contained in `text`, case-insensitive.
///
/// Tokenization is whitespace-based. An empty query scores 0.
pub fn keyword_relevance(text: &str, query: &str) -> f64 {
    let text_lower = text.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matched = words
        .iter()
        .filter(|w| text_lower.contains(&w.to_lowercase()))
        .count();
    #[allow(clippy::cast_precision_loss)]
    {
        matched as f64 / words.len() as f64
    }
}

/// A bounded, scored memory store for one agent.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    entries: Vec<MemoryEntry>,
}

impl MemoryStream {
    /// Create an empty stream.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a memory, compacting if the stream overflows.
    ///
    /// Importance is clamped to 1..=10. On overflow the stream is sorted
    /// by importance (descending, stable) and truncated to the top 80;
    /// insertion order is not preserved across a compaction.
    pub fn add(&mut self, text: impl Into<String>, importance: u8, kind: MemoryKind) {
        self.entries.push(MemoryEntry::new(text, importance, kind));
        if self.entries.len() > MAX_MEMORIES {
            self.entries
                .sort_by(|a, b| b.importance.cmp(&a.importance));
            self.entries.truncate(RETAIN_ON_OVERFLOW);
        }
    }

    /// The last `n` entries in insertion order.
    pub fn recent(&self, n: usize) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        self.entries.get(start..).unwrap_or_default()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Number of stored entries.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stream holds no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The newest entry of the given kind, if any.
    pub fn latest_of_kind(&self, kind: MemoryKind) -> Option<&MemoryEntry> {
        self.entries.iter().rev().find(|e| e.kind == kind)
    }

    /// Top `k` entries for `query` using the default keyword relevance.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<&MemoryEntry> {
        self.retrieve_with(query, k, keyword_relevance)
    }

    /// Top `k` entries for `query` using a caller-supplied relevance
    /// function mapping `(text, query)` to `[0, 1]`.
    pub fn retrieve_with(
        &self,
        query: &str,
        k: usize,
        relevance: impl Fn(&str, &str) -> f64,
    ) -> Vec<&MemoryEntry> {
        let now = Utc::now();
        let mut scored: Vec<(f64, &MemoryEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let age_seconds = (now - entry.timestamp).num_milliseconds().max(0);
                #[allow(clippy::cast_precision_loss)]
                let age = age_seconds as f64 / 1000.0;
                let recency = RECENCY_DECAY.powf(age);
                let importance = f64::from(entry.importance) / 10.0;
                let score = W_RECENCY * recency
                    + W_IMPORTANCE * importance
                    + W_RELEVANCE * relevance(&entry.text, query);
                (score, entry)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(k).map(|(_, e)| e).collect()
    }
}
