use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use chat_api_server::config::Settings;
use chat_api_server::models::chat::{
    BackendKind, ConversationTurn, ProviderId, ProviderInfo,
};
use chat_api_server::security::AdminKeyValidator;
use chat_api_server::services::providers::{ChatBackend, Completion};
use chat_api_server::services::{LlmService, SessionMemory};
use chat_api_server::utils::error::LlmError;
use chat_api_server::{api_router, AppState};

/// How a stub backend responds to completion calls.
#[derive(Clone)]
enum StubBehavior {
    Reply(String),
    Timeout,
    Rejected,
    Unreachable,
}

struct StubBackend {
    id: ProviderId,
    behavior: StubBehavior,
    healthy: bool,
}

impl StubBackend {
    fn new(id: ProviderId, behavior: StubBehavior) -> Arc<dyn ChatBackend> {
        Arc::new(Self {
            id,
            behavior,
            healthy: true,
        })
    }

    fn unhealthy(id: ProviderId) -> Arc<dyn ChatBackend> {
        Arc::new(Self {
            id,
            behavior: StubBehavior::Unreachable,
            healthy: false,
        })
    }
}

#[async_trait]
impl ChatBackend for StubBackend {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: self.id,
            model: format!("{}-test-model", self.id),
            base_url: "http://stub".to_string(),
            temperature: 0.7,
            max_tokens: 64,
            kind: match self.id {
                ProviderId::Groq => BackendKind::Cloud,
                ProviderId::Ollama => BackendKind::Local,
            },
            description: "stub".to_string(),
        }
    }

    async fn complete(&self, turns: &[ConversationTurn]) -> Result<Completion, LlmError> {
        match &self.behavior {
            StubBehavior::Reply(text) => Ok(Completion {
                // Echo the turn count so tests can assert the history was forwarded.
                text: format!("{text} (saw {} turns)", turns.len()),
                model: format!("{}-test-model", self.id),
                provider: self.id,
            }),
            StubBehavior::Timeout => Err(LlmError::Timeout {
                provider: self.id,
                timeout_seconds: 30,
            }),
            StubBehavior::Rejected => Err(LlmError::Rejected {
                provider: self.id,
                status: 401,
                message: "invalid api key".to_string(),
            }),
            StubBehavior::Unreachable => Err(LlmError::Unreachable {
                provider: self.id,
                message: "connection refused".to_string(),
            }),
        }
    }

    async fn health(&self) -> bool {
        self.healthy
    }
}

fn test_state(backends: Vec<Arc<dyn ChatBackend>>, admin_key: Option<&str>) -> AppState {
    AppState {
        memory: Arc::new(SessionMemory::new(16, Duration::from_secs(3600)).unwrap()),
        llm: Arc::new(LlmService::with_backends(backends, ProviderId::Groq).unwrap()),
        admin_validator: Arc::new(AdminKeyValidator::new(admin_key.map(str::to_string))),
        settings: Settings::default(),
    }
}

fn default_backends() -> Vec<Arc<dyn ChatBackend>> {
    vec![
        StubBackend::new(ProviderId::Groq, StubBehavior::Reply("groq says hi".into())),
        StubBackend::new(ProviderId::Ollama, StubBehavior::Reply("ollama says hi".into())),
    ]
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = api_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn chat_round_trip_accumulates_history() {
    let state = test_state(default_backends(), None);

    let (status, body) = send(
        &state,
        post_json("/api/chat", json!({"session_id": "s1", "message": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "s1");
    assert_eq!(body["provider"], "groq");
    assert_eq!(body["model"], "groq-test-model");
    // First exchange: the gateway saw only the single user turn.
    assert_eq!(body["response"], "groq says hi (saw 1 turns)");

    let (status, body) = send(
        &state,
        post_json("/api/chat", json!({"session_id": "s1", "message": "again"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Second exchange: two stored turns plus the new user message.
    assert_eq!(body["response"], "groq says hi (saw 3 turns)");

    assert_eq!(state.memory.get_history("s1").len(), 4);
}

#[tokio::test]
async fn missing_session_id_gets_generated() {
    let state = test_state(default_backends(), None);
    let (status, body) = send(&state, post_json("/api/chat", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = body["session_id"].as_str().unwrap();
    assert!(!session_id.is_empty());
    assert_eq!(state.memory.get_history(session_id).len(), 2);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let state = test_state(default_backends(), None);
    let (status, body) = send(
        &state,
        post_json("/api/chat", json!({"session_id": "s", "message": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn provider_override_does_not_change_default() {
    let state = test_state(default_backends(), None);

    let (status, body) = send(
        &state,
        post_json(
            "/api/chat",
            json!({"session_id": "s", "message": "hi", "provider": "ollama"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "ollama");

    let (status, body) = send(&state, get("/api/llm/provider")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_provider"]["provider"], "groq");

    // Unscoped request still routes to the default.
    let (_, body) = send(
        &state,
        post_json("/api/chat", json!({"session_id": "s2", "message": "hi"})),
    )
    .await;
    assert_eq!(body["provider"], "groq");
}

#[tokio::test]
async fn unknown_override_is_a_client_error() {
    let state = test_state(default_backends(), None);
    let (status, body) = send(
        &state,
        post_json(
            "/api/chat",
            json!({"session_id": "s", "message": "hi", "provider": "chatgpt"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UnknownProvider");
}

#[tokio::test]
async fn failed_exchange_leaves_history_untouched() {
    for (behavior, expected_status, expected_error) in [
        (StubBehavior::Timeout, StatusCode::SERVICE_UNAVAILABLE, "ProviderTimeout"),
        (StubBehavior::Unreachable, StatusCode::SERVICE_UNAVAILABLE, "ProviderUnreachable"),
        (StubBehavior::Rejected, StatusCode::BAD_GATEWAY, "ProviderRejected"),
    ] {
        let state = test_state(
            vec![
                StubBackend::new(ProviderId::Groq, behavior),
                StubBackend::new(ProviderId::Ollama, StubBehavior::Reply("ok".into())),
            ],
            None,
        );

        // Seed one successful exchange through the healthy backend.
        let (status, _) = send(
            &state,
            post_json(
                "/api/chat",
                json!({"session_id": "s", "message": "hi", "provider": "ollama"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let before = state.memory.get_history("s");

        let (status, body) = send(
            &state,
            post_json("/api/chat", json!({"session_id": "s", "message": "boom"})),
        )
        .await;
        assert_eq!(status, expected_status);
        assert_eq!(body["error"], expected_error);

        let after = state.memory.get_history("s");
        assert_eq!(after.len(), before.len());
        assert!(after
            .iter()
            .zip(before.iter())
            .all(|(a, b)| a.content == b.content));
    }
}

#[tokio::test]
async fn clear_session_is_idempotent_over_http() {
    let state = test_state(default_backends(), None);
    send(
        &state,
        post_json("/api/chat", json!({"session_id": "gone", "message": "hi"})),
    )
    .await;

    let delete = |uri: &str| {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = send(&state, delete("/api/chat/session/gone")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session gone cleared successfully");

    let (status, body) = send(&state, delete("/api/chat/session/gone")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session gone not found");

    assert!(state.memory.get_history("gone").is_empty());
}

#[tokio::test]
async fn stats_reports_live_sessions() {
    let state = test_state(default_backends(), None);
    for id in ["a", "b"] {
        send(
            &state,
            post_json("/api/chat", json!({"session_id": id, "message": "hi"})),
        )
        .await;
    }

    let (status, body) = send(&state, get("/api/chat/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["memory_stats"]["current_size"], 2);
    assert_eq!(body["memory_stats"]["max_size"], 16);
    assert_eq!(body["memory_stats"]["ttl_seconds"], 3600);
}

#[tokio::test]
async fn switch_changes_default_and_rejects_unknown() {
    let state = test_state(default_backends(), None);

    let (status, body) = send(
        &state,
        post_json("/api/llm/switch", json!({"provider": "ollama"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default_provider"], "ollama");

    let (status, body) = send(
        &state,
        post_json("/api/llm/switch", json!({"provider": "chatgpt"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UnknownProvider");

    // Default unchanged by the failed switch.
    let (_, body) = send(&state, get("/api/llm/provider")).await;
    assert_eq!(body["current_provider"]["provider"], "ollama");
}

#[tokio::test]
async fn switch_is_admin_gated_when_key_configured() {
    let state = test_state(default_backends(), Some("s3cret"));

    let (status, body) = send(
        &state,
        post_json("/api/llm/switch", json!({"provider": "ollama"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let request = Request::builder()
        .method("POST")
        .uri("/api/llm/switch")
        .header("content-type", "application/json")
        .header("X-API-Key", "s3cret")
        .body(Body::from(json!({"provider": "ollama"}).to_string()))
        .unwrap();
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default_provider"], "ollama");
}

#[tokio::test]
async fn provider_listing_and_health() {
    let state = test_state(default_backends(), None);

    let (status, body) = send(&state, get("/api/llm/providers")).await;
    assert_eq!(status, StatusCode::OK);
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 2);
    // Default listed first.
    assert_eq!(providers[0]["provider"], "groq");
    assert_eq!(providers[0]["type"], "cloud");

    let (status, body) = send(&state, get("/api/llm/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["providers"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["healthy"] == true));

    let (status, body) = send(&state, get("/api/llm/health?provider=chatgpt")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UnknownProvider");
}

#[tokio::test]
async fn unreachable_backend_reports_unhealthy_not_error() {
    let state = test_state(
        vec![
            StubBackend::unhealthy(ProviderId::Groq),
            StubBackend::new(ProviderId::Ollama, StubBehavior::Reply("ok".into())),
        ],
        None,
    );

    let (status, body) = send(&state, get("/api/llm/health?provider=groq")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providers"][0]["healthy"], false);
    assert!(body["providers"][0]["error"].is_string());

    // Readiness follows the default backend.
    let (status, _) = send(&state, get("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn liveness_endpoints_respond() {
    let state = test_state(default_backends(), None);

    let (status, body) = send(&state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send(&state, get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&state, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Chat API"));
}
