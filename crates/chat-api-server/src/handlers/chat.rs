use axum::{
    extract::{Path, State},
    Json,
};
use std::time::Instant;
use tracing::{debug, info};

use crate::models::chat::*;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// Handle one chat exchange with session-based memory.
///
/// The user turn is persisted only together with a successful reply, so a
/// failed provider call leaves the session history exactly as it was and a
/// retry operates on clean history.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let start = Instant::now();

    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let session_id = request
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(
        "Chat request: session={}, message_len={}, provider_override={:?}",
        session_id,
        request.message.len(),
        request.provider
    );

    let history = state.memory.get_history(&session_id);
    debug!("Session {} has {} prior turns", session_id, history.len());

    // system prompt (if configured) + history + current user message
    let mut turns = Vec::with_capacity(history.len() + 2);
    if let Some(prompt) = &state.settings.llm.system_prompt {
        turns.push(ConversationTurn::system(prompt.clone()));
    }
    turns.extend(history);
    turns.push(ConversationTurn::user(request.message.clone()));

    let completion = state
        .llm
        .complete(&turns, request.provider.as_deref())
        .await?;

    state.memory.append_exchange(
        &session_id,
        ConversationTurn::user(request.message),
        ConversationTurn::assistant(completion.text.clone()),
    );

    info!(
        "Chat completed in {}ms: session={}, provider={}",
        start.elapsed().as_millis(),
        session_id,
        completion.provider
    );

    Ok(Json(ChatResponse {
        response: completion.text,
        session_id,
        provider: completion.provider,
        model: completion.model,
    }))
}

/// Clear memory for a specific session. Idempotent.
pub async fn clear_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<SessionClearResponse> {
    let message = if state.memory.clear_session(&session_id) {
        format!("Session {} cleared successfully", session_id)
    } else {
        format!("Session {} not found", session_id)
    };
    Json(SessionClearResponse { message })
}

/// Memory cache statistics snapshot.
pub async fn memory_stats_handler(State(state): State<AppState>) -> Json<MemoryStatsResponse> {
    Json(MemoryStatsResponse {
        memory_stats: state.memory.stats(),
    })
}
