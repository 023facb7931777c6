use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health
/// Liveness plus the two resource gauges: engine instances alive right now
/// and artifacts still leased.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Resume service is running",
        "version": env!("CARGO_PKG_VERSION"),
        "liveRenderSessions": state.renderer.live_sessions(),
        "storedArtifacts": state.store.len(),
        "artifactTtlSeconds": state.store.ttl().as_secs(),
        "pageSize": format!("{:?}", state.config.page_size)
    }))
}
