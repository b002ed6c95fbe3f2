//! Completion backends
//!
//! One `ChatBackend` per configured provider. Backends normalize their wire
//! formats to `ConversationTurn` in, `Completion` out; transport failures are
//! classified into `LlmError` kinds, never raw reqwest errors.

mod groq;
mod ollama;

pub use groq::GroqBackend;
pub use ollama::OllamaBackend;

use async_trait::async_trait;

use crate::models::chat::{ConversationTurn, ProviderId, ProviderInfo};
use crate::utils::error::LlmError;

/// A completed exchange: the reply plus which model/provider served it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub provider: ProviderId,
}

/// Uniform interface over completion backends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Static configuration snapshot for listing endpoints.
    fn info(&self) -> ProviderInfo;

    /// Send the full turn sequence, roles preserved in order.
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<Completion, LlmError>;

    /// Lightweight reachability probe. Reports unhealthy instead of
    /// propagating transport errors.
    async fn health(&self) -> bool;
}

/// Shared generation parameters, identical across backends.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}
