//! REST read endpoints backed by the world snapshot.
//!
//! Everything here is read-only: handlers take the world read lock,
//! project the state they need, and release it. Spectator dashboards use
//! these for initial paints and tooling; the live view runs over the
//! `WebSocket` stream.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use skirmish_types::{AgentId, AgentSnapshot, GameEvent, WorldStateView};
use uuid::Uuid;

use crate::state::AppState;

/// `GET /` -- minimal status page.
pub async fn index() -> Html<&'static str> {
    Html(
        "<html><body><h1>skirmish-server</h1>\
         <p>WebSocket: <code>/ws</code> &middot; REST: <code>/api/world</code>, \
         <code>/api/agents</code>, <code>/api/events</code></p></body></html>",
    )
}

/// `GET /api/world` -- the current world summary.
pub async fn get_world(State(state): State<AppState>) -> Json<WorldStateView> {
    let world = state.world.read().await;
    Json(world.world_state())
}

/// `GET /api/agents` -- all agents in full form.
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSnapshot>> {
    let world = state.world.read().await;
    Json(world.agent_snapshots())
}

/// `GET /api/agents/{id}` -- one agent in full form.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AgentSnapshot>, StatusCode> {
    let world = state.world.read().await;
    let agent_id = AgentId::from(id);
    world
        .agents
        .get(&agent_id)
        .map(|agent| Json(agent.snapshot()))
        .ok_or(StatusCode::NOT_FOUND)
}

/// `GET /api/events` -- the recent event log, oldest first.
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<GameEvent>> {
    let world = state.world.read().await;
    Json(world.recent_events.iter().cloned().collect())
}
