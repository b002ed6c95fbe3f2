pub mod chat;
pub mod health;
pub mod llm;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::security::middleware::admin_middleware;
use crate::state::AppState;

/// Build the full application router.
pub fn api_router(state: AppState) -> Router {
    // Admin routes (mutate process-wide state)
    let admin_routes = Router::new()
        .route("/api/llm/switch", post(llm::switch_provider_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/chat", post(chat::chat_handler))
        .route(
            "/api/chat/session/{session_id}",
            delete(chat::clear_session_handler),
        )
        .route("/api/chat/stats", get(chat::memory_stats_handler))
        .route("/api/llm/provider", get(llm::current_provider_handler))
        .route("/api/llm/providers", get(llm::list_providers_handler))
        .route("/api/llm/health", get(llm::provider_health_handler))
        .merge(admin_routes)
        .with_state(state)
}
