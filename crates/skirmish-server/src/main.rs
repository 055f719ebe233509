//! Server binary for the Skirmish simulation.
//!
//! Wires together the world, the decision backend, the tick driver, and
//! the spectator gateway.
//!
//! # Startup sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration (YAML file + environment overrides)
//! 3. Construct the decision backend
//! 4. Create and initialize the world
//! 5. Spawn the tick driver (the world's single writer)
//! 6. Serve the gateway
//!
//! # Environment
//!
//! - `SKIRMISH_CONFIG` -- path to the YAML config (default `skirmish.yaml`,
//!   missing file falls back to defaults)
//! - `SKIRMISH_PORT` -- listen port (default 8700)
//! - `SKIRMISH_AGENT_COUNT` -- override `agent_count`
//! - `SKIRMISH_TICK_INTERVAL_MS` -- override `tick_interval_ms`
//! - `SKIRMISH_AGENT_SYNC` -- `delta` (default) or `full`
//! - `SKIRMISH_ALLOWED_ORIGINS` -- comma-separated CORS allowlist
//!   (default: any origin)

mod driver;
mod error;
mod handlers;
mod router;
mod state;
mod ws;

use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use skirmish_backend::{DecisionBackend, LlmSettings};
use skirmish_core::{BackendChoice, World, WorldConfig};
use tokio::sync::{RwLock, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::driver::AgentSyncMode;
use crate::error::ServerError;
use crate::state::{AppState, INTENT_CAPACITY};

/// Default listen port.
const DEFAULT_PORT: u16 = 8700;

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "skirmish.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("skirmish-server starting");

    // 2. Configuration.
    let config = load_config()?;
    info!(
        grid_size = config.grid_size,
        agent_count = config.agent_count,
        tick_interval_ms = config.tick_interval_ms,
        voting_window_ms = config.voting_window_ms,
        "configuration loaded"
    );

    // 3. Decision backend.
    let backend = build_backend(&config)?;
    info!(backend = backend.name(), "decision backend ready");

    // 4. World.
    let mut world = World::new(config.clone());
    world.init()?;
    let world = Arc::new(RwLock::new(world));

    // 5. Tick driver.
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_CAPACITY);
    let app_state = AppState::new(Arc::clone(&world), intent_tx);
    let sync_mode = agent_sync_mode();
    let driver_state = app_state.clone();
    tokio::spawn(async move {
        if let Err(err) = driver::run_driver(driver_state, backend, intent_rx, sync_mode).await {
            tracing::error!(error = %err, "tick driver halted");
        }
    });

    // 6. Gateway.
    let port = env_parse("SKIRMISH_PORT").unwrap_or(DEFAULT_PORT);
    let origins = allowed_origins();
    let app = router::build_router(app_state, &origins);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load the YAML config (if present) and apply environment overrides.
fn load_config() -> Result<WorldConfig, ServerError> {
    let path = std::env::var("SKIRMISH_CONFIG").unwrap_or_else(|_| String::from(DEFAULT_CONFIG_PATH));
    let mut config = if Path::new(&path).exists() {
        WorldConfig::from_yaml_file(Path::new(&path))?
    } else {
        info!(path = %path, "no config file, using defaults");
        WorldConfig::default()
    };

    if let Some(count) = env_parse("SKIRMISH_AGENT_COUNT") {
        config.agent_count = count;
    }
    if let Some(interval) = env_parse("SKIRMISH_TICK_INTERVAL_MS") {
        config.tick_interval_ms = interval;
    }
    Ok(config)
}

/// Construct the configured backend; `llm` without a key degrades to
/// rule-based with a warning.
fn build_backend(config: &WorldConfig) -> Result<DecisionBackend, ServerError> {
    match config.backend {
        BackendChoice::RuleBased => Ok(DecisionBackend::rule_based()),
        BackendChoice::Llm => match &config.llm.api_key {
            Some(api_key) => {
                let settings = LlmSettings {
                    base_url: config.llm.base_url.clone(),
                    api_key: api_key.clone(),
                    model: config.llm.model.clone(),
                    max_concurrency: config.llm.max_concurrency,
                    temperature: config.llm.temperature,
                    deadline: std::time::Duration::from_millis(config.llm.deadline_ms),
                };
                Ok(DecisionBackend::llm(settings)?)
            }
            None => {
                warn!("backend is llm but no api key is configured; using rule-based");
                Ok(DecisionBackend::rule_based())
            }
        },
    }
}

/// Parse an environment variable, ignoring absent or malformed values.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// The agent broadcast mode from the environment.
fn agent_sync_mode() -> AgentSyncMode {
    match std::env::var("SKIRMISH_AGENT_SYNC").as_deref() {
        Ok("full") => AgentSyncMode::Full,
        _ => AgentSyncMode::Delta,
    }
}

/// Parse the CORS allowlist; empty means "any origin".
fn allowed_origins() -> Vec<HeaderValue> {
    std::env::var("SKIRMISH_ALLOWED_ORIGINS")
        .ok()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
                .collect()
        })
        .unwrap_or_default()
}
