use std::sync::Arc;

use crate::config::Settings;
use crate::security::AdminKeyValidator;
use crate::services::{LlmService, SessionMemory};

/// Application state shared across handlers.
///
/// The memory cache and the gateway never call each other; both are driven
/// by the chat handler.
#[derive(Clone)]
pub struct AppState {
    pub memory: Arc<SessionMemory>,
    pub llm: Arc<LlmService>,
    pub admin_validator: Arc<AdminKeyValidator>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let memory = Arc::new(SessionMemory::new(
            settings.memory.max_sessions,
            std::time::Duration::from_secs(settings.memory.ttl_seconds),
        )?);
        let llm = Arc::new(LlmService::new(&settings.llm)?);
        let admin_validator = Arc::new(AdminKeyValidator::new(
            settings.security.admin_api_key.clone(),
        ));
        Ok(Self {
            memory,
            llm,
            admin_validator,
            settings,
        })
    }
}
