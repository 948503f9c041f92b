//! Health handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use domain_occupancy::OccupancyStore;

use crate::AppState;

/// Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe; verifies the store answers
pub async fn readiness_check(State(state): State<AppState>) -> Json<Value> {
    let ready = state.occupancy.rooms().await.is_ok();
    Json(json!({ "status": if ready { "ready" } else { "degraded" } }))
}
