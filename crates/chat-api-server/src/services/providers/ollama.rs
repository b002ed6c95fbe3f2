use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OllamaConfig;
use crate::models::chat::{BackendKind, ConversationTurn, ProviderId, ProviderInfo, Role};
use crate::services::providers::{ChatBackend, Completion, GenerationParams};
use crate::utils::error::LlmError;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

/// Locally hosted Ollama model server backend.
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
    params: GenerationParams,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig, params: GenerationParams) -> anyhow::Result<Self> {
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
impl ChatBackend for OllamaBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: ProviderId::Ollama,
            model: self.config.model.clone(),
            base_url: self.config.base_url.clone(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            kind: BackendKind::Local,
            description: "Locally hosted Ollama model server".to_string(),
        }
    }

    async fn complete(&self, turns: &[ConversationTurn]) -> Result<Completion, LlmError> {
        debug!("Ollama completion with {} turns", turns.len());

        let request = OllamaChatRequest {
            model: &self.config.model,
            messages: turns
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role,
                    content: &turn.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: self.params.temperature,
                num_predict: self.params.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                LlmError::from_transport(ProviderId::Ollama, self.params.timeout_seconds, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Rejected {
                provider: ProviderId::Ollama,
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: OllamaChatResponse = response.json().await.map_err(|e| {
            LlmError::from_transport(ProviderId::Ollama, self.params.timeout_seconds, e)
        })?;

        Ok(Completion {
            text: parsed.message.content,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            provider: ProviderId::Ollama,
        })
    }

    async fn health(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                false
            }
        }
    }
}
