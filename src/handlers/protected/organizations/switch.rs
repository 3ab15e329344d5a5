// handlers/protected/organizations/switch.rs - POST /api/organizations/switch handler

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::handlers::{session_json, session_user};
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::{switch_organization, SessionState};

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub organization_id: Uuid,
}

/// POST /api/organizations/switch - Change the active organization
///
/// 403 when the caller has no access to the target; the stored selection is
/// unchanged in that case.
pub async fn switch_post(
    State(state): State<AppState>,
    Extension(session): Extension<SessionState>,
    Json(payload): Json<SwitchRequest>,
) -> ApiResult<Value> {
    let user = session_user(&session)?;
    let ctx = switch_organization(&state, user, payload.organization_id).await?;
    Ok(ApiResponse::success(session_json(&SessionState::Active(ctx))))
}
