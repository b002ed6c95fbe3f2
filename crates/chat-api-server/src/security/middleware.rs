use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::state::AppState;
use crate::utils::error::ApiError;

/// Admin middleware - gate mutating provider routes behind the shared key.
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.admin_validator.validate(request.headers())?;
    debug!("Admin request authorized: {}", request.uri().path());
    Ok(next.run(request).await)
}
