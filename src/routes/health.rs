//! Health check endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub auth_status: &'static str,
}

/// GET /
///
/// Liveness probe that also reports whether vision credentials resolved.
pub async fn root_status(State(state): State<AppState>) -> Json<RootResponse> {
    let auth_status = if state.analyzer().vision_ready() {
        "Authenticated"
    } else {
        "Authentication Failed"
    };

    Json(RootResponse {
        message: "Nutrition Label Analyzer API is running",
        auth_status,
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub vision: bool,
    pub completion: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "label-lens-server",
        vision: state.analyzer().vision_ready(),
        completion: state.analyzer().completion_ready(),
    })
}
