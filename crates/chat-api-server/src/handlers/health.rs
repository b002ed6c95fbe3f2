use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiInfoResponse {
    message: String,
    version: String,
    health: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

pub async fn root() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        message: "Conversational Chat API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        health: "/health".to_string(),
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "chat-api-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness depends on the default completion backend answering its probe.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    if state.llm.default_healthy().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
