// handlers/protected/organization/members.rs - Membership handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{MemberView, Membership};
use crate::middleware::{ApiResponse, ApiResult};
use crate::permissions::Role;
use crate::services::membership_service;
use crate::tenancy::OrgContext;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// GET /api/organization/members
pub async fn members_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> ApiResult<Vec<MemberView>> {
    Ok(ApiResponse::success(membership_service::list_members(&state, &ctx).await?))
}

/// PUT /api/organization/members/:user_id - Replace a member's role (Admin+)
pub async fn member_put(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleRequest>,
) -> ApiResult<Membership> {
    let membership = membership_service::set_role(&state, &ctx, user_id, payload.role).await?;
    Ok(ApiResponse::success(membership))
}

/// DELETE /api/organization/members/:user_id (Admin+)
pub async fn member_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Value> {
    membership_service::remove_member(&state, &ctx, user_id).await?;
    Ok(ApiResponse::success(json!({ "user_id": user_id, "removed": true })))
}
