//! Health endpoint.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of indexed chunks across both snapshots.
    pub chunks: usize,
}

/// `GET /api/health` — liveness plus index size.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: prepost_core::version().into(),
        chunks: state.index.len(),
    })
}
