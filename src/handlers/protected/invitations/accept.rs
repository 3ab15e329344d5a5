// handlers/protected/invitations/accept.rs - POST /api/invitations/accept handler

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::handlers::session_user;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::invitation_service;
use crate::tenancy::SessionState;

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub token: String,
}

/// POST /api/invitations/accept - Join the inviting organization
///
/// The invitation must be pending, unexpired and addressed to the caller's
/// email. The organization becomes the caller's active one.
pub async fn accept_post(
    State(state): State<AppState>,
    Extension(session): Extension<SessionState>,
    Json(payload): Json<AcceptRequest>,
) -> ApiResult<Value> {
    let mut user = session_user(&session)?;
    let membership = invitation_service::accept(&state, &mut user, payload.token.trim()).await?;

    Ok(ApiResponse::success(json!({
        "organization_id": membership.organization_id,
        "role": membership.role,
    })))
}
