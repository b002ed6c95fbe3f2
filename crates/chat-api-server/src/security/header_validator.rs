use axum::http::HeaderMap;
use tracing::warn;

use crate::utils::error::ApiError;

/// Shared-key check for admin routes.
///
/// No key configured means the admin routes are open; intended for local
/// development only.
#[derive(Debug, Clone)]
pub struct AdminKeyValidator {
    expected_api_key: Option<String>,
}

impl AdminKeyValidator {
    pub fn new(expected_api_key: Option<String>) -> Self {
        let expected_api_key = expected_api_key.filter(|key| !key.is_empty());
        if expected_api_key.is_none() {
            warn!("No admin API key configured, admin routes are unprotected");
        }
        Self { expected_api_key }
    }

    /// Validate the `X-API-Key` header against the configured key.
    pub fn validate(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let Some(expected) = &self.expected_api_key else {
            return Ok(());
        };

        let api_key = headers
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-API-Key header".to_string()))?;

        if api_key != expected {
            warn!("Invalid X-API-Key on admin route");
            return Err(ApiError::Unauthorized("Invalid X-API-Key".to_string()));
        }
        Ok(())
    }
}
