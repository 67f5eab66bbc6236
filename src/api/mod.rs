// API route assembly, split by domain.
pub mod errors;
pub mod reports;

use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/synapse/health", get(health))
        .merge(reports::router())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let storage_ready = state.storage.ensure_initialized().is_ok();
    Json(json!({ "ok": true, "storage_ready": storage_ready }))
}
