use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GroqConfig;
use crate::models::chat::{BackendKind, ConversationTurn, ProviderId, ProviderInfo, Role};
use crate::services::providers::{ChatBackend, Completion, GenerationParams};
use crate::utils::error::LlmError;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

/// Groq cloud backend, OpenAI-compatible chat completions API.
pub struct GroqBackend {
    client: Client,
    config: GroqConfig,
    params: GenerationParams,
}

impl GroqBackend {
    pub fn new(config: GroqConfig, params: GenerationParams) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(params.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            config,
            params,
        })
    }
}

#[async_trait]
impl ChatBackend for GroqBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Groq
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: ProviderId::Groq,
            model: self.config.model.clone(),
            base_url: self.config.base_url.clone(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            kind: BackendKind::Cloud,
            description: "Groq cloud-based LLM inference".to_string(),
        }
    }

    async fn complete(&self, turns: &[ConversationTurn]) -> Result<Completion, LlmError> {
        debug!("Groq completion with {} turns", turns.len());

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: turns
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role,
                    content: &turn.content,
                })
                .collect(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            stream: false,
        };

        let mut call = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .json(&request);
        if let Some(api_key) = &self.config.api_key {
            call = call.bearer_auth(api_key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| LlmError::from_transport(ProviderId::Groq, self.params.timeout_seconds, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Rejected {
                provider: ProviderId::Groq,
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            LlmError::from_transport(ProviderId::Groq, self.params.timeout_seconds, e)
        })?;

        let text = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::Rejected {
                provider: ProviderId::Groq,
                status: status.as_u16(),
                message: "No choices returned from Groq".to_string(),
            })?;

        Ok(Completion {
            text,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            provider: ProviderId::Groq,
        })
    }

    async fn health(&self) -> bool {
        let mut call = self.client.get(format!("{}/models", self.config.base_url));
        if let Some(api_key) = &self.config.api_key {
            call = call.bearer_auth(api_key);
        }
        match call.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Groq health check failed: {}", e);
                false
            }
        }
    }
}
