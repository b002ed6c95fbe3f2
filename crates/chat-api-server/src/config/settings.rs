use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::models::chat::ProviderId;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SecurityConfig {
    /// Shared key required in `X-API-Key` on admin routes.
    /// Unset leaves the admin routes open (development mode).
    #[serde(default)]
    pub admin_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub default_provider: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Prepended as a system turn on every completion; not stored in memory.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub groq: GroqConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: "groq".to_string(),
            timeout_seconds: 30,
            temperature: 0.7,
            max_tokens: 1024,
            system_prompt: None,
            groq: GroqConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GroqConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    pub ttl_seconds: u64,
    pub max_sessions: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            max_sessions: 1000,
        }
    }
}

impl Settings {
    /// Load configuration from `config/settings.toml` (optional) and
    /// `APP__`-prefixed environment variables, `.env` included.
    ///
    /// Validation is fail-fast: a service with a zero-sized or instantly
    /// expiring cache, or an unknown default provider, must not start.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to assemble configuration sources")?;

        let settings: Settings = config
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory.ttl_seconds == 0 {
            bail!("invalid configuration: memory.ttl_seconds must be greater than zero");
        }
        if self.memory.max_sessions == 0 {
            bail!("invalid configuration: memory.max_sessions must be greater than zero");
        }
        if self.llm.timeout_seconds == 0 {
            bail!("invalid configuration: llm.timeout_seconds must be greater than zero");
        }
        if self.llm.default_provider.parse::<ProviderId>().is_err() {
            bail!(
                "invalid configuration: unknown llm.default_provider '{}'",
                self.llm.default_provider
            );
        }
        Ok(())
    }
}
