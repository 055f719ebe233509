//! LLM decision backend.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint over HTTP.
//! Every call passes through a counted concurrency gate (a
//! `tokio::sync::Semaphore`) so no more than `max_concurrency` requests
//! are ever in flight, and honors a per-call deadline shorter than the
//! tick interval. On *any* failure -- connection error, rate limit,
//! deadline, unparseable response -- the call falls back to an owned
//! rule-based delegate, so `decide` always returns a valid decision.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use skirmish_types::{Decision, DecisionContext, ReflectContext, ThinkingProcess};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::parse::parse_action_response;
use crate::prompt::{PromptEngine, RenderedPrompt};
use crate::rule::RuleBackend;

/// Token budget for a decision completion.
const DECIDE_MAX_TOKENS: u32 = 150;

/// Token budget for a reflection completion.
const REFLECT_MAX_TOKENS: u32 = 100;

/// Sentinel a reflection may answer with to mean "nothing to say".
const REFLECT_NOTHING: &str = "NOTHING";

// ---------------------------------------------------------------------------
// Concurrency gate
// ---------------------------------------------------------------------------

/// A counted gate bounding concurrent in-flight LLM calls.
///
/// Thin wrapper over [`Semaphore`] with owned permits so a permit can be
/// held across an `await` without borrowing the gate. Release is by RAII
/// drop, which covers the error paths for free.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// The configured capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait for a slot. Fair in arrival order (tokio semaphore FIFO).
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, BackendError> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| BackendError::GateClosed)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Connection and sampling settings for the LLM backend.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Remote model identifier.
    pub model: String,
    /// Maximum concurrent in-flight calls.
    pub max_concurrency: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Per-call deadline; must stay below the tick interval.
    pub deadline: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.deepseek.com/v1"),
            api_key: String::new(),
            model: String::from("deepseek-chat"),
            max_concurrency: 10,
            temperature: 0.7,
            deadline: Duration::from_millis(900),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Decision backend that consults a remote LLM, gated and deadlined,
/// with a rule-based fallback.
pub struct LlmDecisionBackend {
    client: reqwest::Client,
    settings: LlmSettings,
    gate: ConcurrencyGate,
    prompts: PromptEngine,
    fallback: RuleBackend,
}

impl LlmDecisionBackend {
    /// Create a backend from settings.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Template`] if the embedded prompt
    /// templates fail to parse.
    pub fn new(settings: LlmSettings) -> Result<Self, BackendError> {
        let gate = ConcurrencyGate::new(settings.max_concurrency);
        Ok(Self {
            client: reqwest::Client::new(),
            settings,
            gate,
            prompts: PromptEngine::new()?,
            fallback: RuleBackend::new(),
        })
    }

    /// The gate bounding this backend's concurrency.
    pub const fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Decide one agent's action, falling back to rules on any failure.
    pub async fn decide(&self, ctx: &DecisionContext) -> Decision {
        match self.try_decide(ctx).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(agent = %ctx.name, error = %err, "llm decide failed, using rule fallback");
                self.fallback.decide(ctx)
            }
        }
    }

    /// Reflect on recent memories, falling back to rules on any failure.
    pub async fn reflect(&self, ctx: &ReflectContext) -> Option<String> {
        match self.try_reflect(ctx).await {
            Ok(reflection) => reflection,
            Err(err) => {
                warn!(agent = %ctx.name, error = %err, "llm reflect failed, using rule fallback");
                self.fallback.reflect(ctx)
            }
        }
    }

    /// The gated, deadlined LLM decision path.
    async fn try_decide(&self, ctx: &DecisionContext) -> Result<Decision, BackendError> {
        let _permit = self.gate.acquire().await?;
        let prompt = self.prompts.render_decide(ctx)?;

        let started = Instant::now();
        let raw = self.complete(&prompt, DECIDE_MAX_TOKENS).await?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(agent = %ctx.name, latency_ms, "llm decision received");

        let mut decision = parse_action_response(&raw, ctx)?;
        decision.thinking = Some(ThinkingProcess {
            action: format!("{:?}", decision.kind),
            reasoning: decision
                .reason
                .clone()
                .unwrap_or_else(|| String::from("(no reason given)")),
            prompt: Some(prompt.combined()),
            raw_response: Some(raw),
            timestamp: Utc::now(),
        });
        Ok(decision)
    }

    /// The gated, deadlined LLM reflection path.
    async fn try_reflect(&self, ctx: &ReflectContext) -> Result<Option<String>, BackendError> {
        let _permit = self.gate.acquire().await?;
        let prompt = self.prompts.render_reflect(ctx)?;
        let raw = self.complete(&prompt, REFLECT_MAX_TOKENS).await?;
        let text = raw.trim();
        if text.is_empty() || text.eq_ignore_ascii_case(REFLECT_NOTHING) {
            return Ok(None);
        }
        Ok(Some(text.to_owned()))
    }

    /// Send one chat completion and return the response text, bounded by
    /// the per-call deadline.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        max_tokens: u32,
    ) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.settings.base_url);
        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": self.settings.temperature,
            "max_tokens": max_tokens
        });

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.settings.deadline, request)
            .await
            .map_err(|_| BackendError::Deadline)?
            .map_err(|e| BackendError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unable to read error body"));
            return Err(BackendError::Http(format!(
                "endpoint returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = tokio::time::timeout(self.settings.deadline, response.json())
            .await
            .map_err(|_| BackendError::Deadline)?
            .map_err(|e| BackendError::Http(format!("response parse failed: {e}")))?;

        extract_content(&json)
    }
}

/// Extract the text content from a chat-completions response.
fn extract_content(json: &serde_json::Value) -> Result<String, BackendError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            BackendError::Http(String::from(
                "response missing choices[0].message.content",
            ))
        })
}
