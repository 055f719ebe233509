//! World configuration.
//!
//! All options carry defaults so an empty file (or no file) yields a
//! playable world. The server loads a YAML file and applies environment
//! overrides on top; the world itself only ever sees the final struct.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Which decision backend drives the agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BackendChoice {
    /// Deterministic priority rules (the default).
    #[default]
    #[serde(rename = "rule-based")]
    RuleBased,
    /// Remote LLM with rule fallback. Requires an API key.
    #[serde(rename = "llm")]
    Llm,
}

/// Where reasoning artifacts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThinkingStorageChoice {
    /// Bounded in-memory store (the default).
    #[default]
    #[serde(rename = "in-memory")]
    InMemory,
    /// Discard everything.
    #[serde(rename = "null")]
    Null,
}

/// LLM backend connection options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; when absent the server falls back to the rule backend.
    pub api_key: Option<String>,
    /// Remote model identifier.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// Maximum concurrent in-flight calls.
    pub max_concurrency: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Per-call deadline in milliseconds; keep below the tick interval.
    pub deadline_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: String::from("deepseek-chat"),
            base_url: String::from("https://api.deepseek.com/v1"),
            max_concurrency: 10,
            temperature: 0.7,
            deadline_ms: 900,
        }
    }
}

/// Complete world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// The map is `grid_size x grid_size` tiles.
    pub grid_size: i32,
    /// Number of agents spawned at init.
    pub agent_count: u32,
    /// Driver cadence in milliseconds.
    pub tick_interval_ms: u64,
    /// Voting window length in milliseconds.
    pub voting_window_ms: u64,
    /// Ticks between zone shrink steps.
    pub shrink_interval_ticks: u64,
    /// Fraction of tiles blocked at init.
    pub obstacle_density: f64,
    /// Manhattan perception radius.
    pub vision_range: u32,
    /// Floor for the safe-zone side length.
    pub min_border: i32,
    /// Optional seed for reproducible maps and combat rolls.
    pub seed: Option<u64>,
    /// Which decision backend drives the agents.
    pub backend: BackendChoice,
    /// LLM backend options (used when `backend = llm`).
    pub llm: LlmConfig,
    /// Where reasoning artifacts are kept.
    pub thinking_storage: ThinkingStorageChoice,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            agent_count: 10,
            tick_interval_ms: 1000,
            voting_window_ms: 30_000,
            shrink_interval_ticks: 30,
            obstacle_density: 0.15,
            vision_range: 4,
            min_border: 6,
            seed: None,
            backend: BackendChoice::default(),
            llm: LlmConfig::default(),
            thinking_storage: ThinkingStorageChoice::default(),
        }
    }
}

impl WorldConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, WorldError> {
        serde_yml::from_str(text).map_err(|e| WorldError::Config(format!("yaml parse: {e}")))
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, WorldError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| WorldError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    /// The tick cadence as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The voting window as a [`Duration`].
    pub const fn voting_window(&self) -> Duration {
        Duration::from_millis(self.voting_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let config = WorldConfig::default();
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.agent_count, 10);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.voting_window_ms, 30_000);
        assert_eq!(config.shrink_interval_ticks, 30);
        assert!((config.obstacle_density - 0.15).abs() < 1e-9);
        assert_eq!(config.vision_range, 4);
        assert_eq!(config.min_border, 6);
        assert_eq!(config.backend, BackendChoice::RuleBased);
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.llm.max_concurrency, 10);
        assert_eq!(config.thinking_storage, ThinkingStorageChoice::InMemory);
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = WorldConfig::from_yaml("{}");
        assert_eq!(config.ok(), Some(WorldConfig::default()));
    }

    #[test]
    fn partial_yaml_overrides() {
        let config = WorldConfig::from_yaml(
            "grid_size: 32\nbackend: llm\nllm:\n  api_key: sk-test\n  max_concurrency: 4\n",
        );
        let config = config.unwrap_or_default();
        assert_eq!(config.grid_size, 32);
        assert_eq!(config.backend, BackendChoice::Llm);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.max_concurrency, 4);
        // Untouched options keep their defaults.
        assert_eq!(config.agent_count, 10);
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let result = WorldConfig::from_yaml("grid_size: [not a number");
        assert!(result.is_err());
    }
}
