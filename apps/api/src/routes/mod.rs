pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::delivery::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/resume/generate", post(handlers::handle_generate))
        .route(
            "/api/resume/download/:id",
            get(handlers::handle_download),
        )
        .with_state(state)
}
