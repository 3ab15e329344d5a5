// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::Extension;
use serde_json::Value;

use crate::handlers::session_json;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::SessionState;

/// GET /api/auth/whoami - Current user and resolved organization
pub async fn whoami_get(Extension(session): Extension<SessionState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(session_json(&session)))
}
