use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::models::chat::{ConversationTurn, ProviderHealth, ProviderId, ProviderInfo};
use crate::services::providers::{
    ChatBackend, Completion, GenerationParams, GroqBackend, OllamaBackend,
};
use crate::utils::error::LlmError;

/// Provider gateway: one completion operation regardless of backend.
///
/// Holds one backend per configured provider and the single piece of mutable
/// gateway state, the process-wide default provider pointer. The pointer is
/// guarded so a concurrent switch never races a read into an inconsistent
/// selection.
pub struct LlmService {
    backends: HashMap<ProviderId, Arc<dyn ChatBackend>>,
    default: RwLock<ProviderId>,
}

impl LlmService {
    /// Build the gateway from configuration with the Groq and Ollama
    /// backends registered.
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let params = GenerationParams {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_seconds: config.timeout_seconds,
        };
        let backends: Vec<Arc<dyn ChatBackend>> = vec![
            Arc::new(GroqBackend::new(config.groq.clone(), params)?),
            Arc::new(OllamaBackend::new(config.ollama.clone(), params)?),
        ];
        let default = config
            .default_provider
            .parse::<ProviderId>()
            .map_err(|other| anyhow::anyhow!("unknown default provider '{}'", other))?;
        Self::with_backends(backends, default)
    }

    /// Assemble a gateway from pre-built backends. Tests construct
    /// independent instances this way instead of sharing process globals.
    pub fn with_backends(
        backends: Vec<Arc<dyn ChatBackend>>,
        default: ProviderId,
    ) -> anyhow::Result<Self> {
        let backends: HashMap<ProviderId, Arc<dyn ChatBackend>> =
            backends.into_iter().map(|b| (b.id(), b)).collect();
        if !backends.contains_key(&default) {
            anyhow::bail!("default provider '{}' has no configured backend", default);
        }
        info!("LLM gateway initialized with default provider: {}", default);
        Ok(Self {
            backends,
            default: RwLock::new(default),
        })
    }

    pub fn default_provider(&self) -> ProviderId {
        *self.default.read()
    }

    fn backend(&self, id: ProviderId) -> Result<&Arc<dyn ChatBackend>, LlmError> {
        self.backends
            .get(&id)
            .ok_or_else(|| LlmError::UnknownProvider(id.to_string()))
    }

    /// Resolve the effective provider: explicit override if given and known,
    /// else the current process-wide default.
    fn resolve(&self, provider_override: Option<&str>) -> Result<ProviderId, LlmError> {
        match provider_override {
            Some(raw) => {
                let id = raw
                    .parse::<ProviderId>()
                    .map_err(LlmError::UnknownProvider)?;
                self.backend(id)?;
                Ok(id)
            }
            None => Ok(self.default_provider()),
        }
    }

    /// Forward the turn sequence to the selected backend.
    pub async fn complete(
        &self,
        turns: &[ConversationTurn],
        provider_override: Option<&str>,
    ) -> Result<Completion, LlmError> {
        let id = self.resolve(provider_override)?;
        debug!("Routing completion to provider: {}", id);
        self.backend(id)?.complete(turns).await
    }

    /// Atomically change the process-wide default. An unknown identifier
    /// leaves the current default unchanged.
    pub fn switch_default(&self, provider: &str) -> Result<ProviderId, LlmError> {
        let id = provider
            .parse::<ProviderId>()
            .map_err(LlmError::UnknownProvider)?;
        self.backend(id)?;
        let mut default = self.default.write();
        let previous = *default;
        *default = id;
        info!("Default provider switched: {} -> {}", previous, id);
        Ok(id)
    }

    /// Probe one backend, or all configured backends concurrently.
    pub async fn health(&self, provider: Option<&str>) -> Result<Vec<ProviderHealth>, LlmError> {
        let targets: Vec<&Arc<dyn ChatBackend>> = match provider {
            Some(raw) => {
                let id = raw
                    .parse::<ProviderId>()
                    .map_err(LlmError::UnknownProvider)?;
                vec![self.backend(id)?]
            }
            None => {
                let mut all: Vec<_> = self.backends.values().collect();
                all.sort_by_key(|b| b.id().to_string());
                all
            }
        };

        let probes = targets.iter().map(|backend| async {
            let healthy = backend.health().await;
            ProviderHealth {
                provider: backend.id(),
                healthy,
                error: (!healthy).then(|| format!("Provider {} is not responding", backend.id())),
            }
        });
        Ok(join_all(probes).await)
    }

    /// True if the current default backend answers its health probe.
    pub async fn default_healthy(&self) -> bool {
        let id = self.default_provider();
        match self.backend(id) {
            Ok(backend) => backend.health().await,
            Err(_) => false,
        }
    }

    /// Static info for every configured backend, default first.
    pub fn providers(&self) -> Vec<ProviderInfo> {
        let default = self.default_provider();
        let mut infos: Vec<ProviderInfo> = self.backends.values().map(|b| b.info()).collect();
        infos.sort_by_key(|info| (info.provider != default, info.provider.to_string()));
        infos
    }

    /// Info for the current default backend.
    pub fn current(&self) -> ProviderInfo {
        let id = self.default_provider();
        self.backends
            .get(&id)
            .map(|b| b.info())
            .expect("default provider always has a backend")
    }
}
