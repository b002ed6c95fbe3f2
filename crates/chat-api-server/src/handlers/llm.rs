use axum::{
    extract::{Query, State},
    Json,
};

use crate::models::chat::*;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// Info for the current default provider.
pub async fn current_provider_handler(
    State(state): State<AppState>,
) -> Json<CurrentProviderResponse> {
    Json(CurrentProviderResponse {
        current_provider: state.llm.current(),
    })
}

/// All configured providers, default first.
pub async fn list_providers_handler(State(state): State<AppState>) -> Json<ProviderListResponse> {
    Json(ProviderListResponse {
        providers: state.llm.providers(),
    })
}

/// Probe one backend (`?provider=`) or all of them.
/// An unreachable backend is reported unhealthy, never a transport error.
pub async fn provider_health_handler(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> Result<Json<ProviderHealthResponse>, ApiError> {
    let providers = state.llm.health(query.provider.as_deref()).await?;
    Ok(Json(ProviderHealthResponse { providers }))
}

/// Switch the process-wide default provider. Admin-gated.
pub async fn switch_provider_handler(
    State(state): State<AppState>,
    Json(request): Json<SwitchRequest>,
) -> Result<Json<SwitchResponse>, ApiError> {
    let default_provider = state.llm.switch_default(&request.provider)?;
    Ok(Json(SwitchResponse {
        message: format!("Default provider switched to {}", default_provider),
        default_provider,
    }))
}
