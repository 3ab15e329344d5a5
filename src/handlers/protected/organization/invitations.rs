// handlers/protected/organization/invitations.rs - Invitation management handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Invitation;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::invitation_service::{self, InvitationRequest};
use crate::tenancy::OrgContext;

/// GET /api/organization/invitations (Admin+)
pub async fn invitations_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> ApiResult<Vec<Invitation>> {
    Ok(ApiResponse::success(invitation_service::list(&state, &ctx).await?))
}

/// POST /api/organization/invitations (Admin+)
///
/// The plain token is returned once, here, for delivery to the invitee.
pub async fn invitations_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<InvitationRequest>,
) -> ApiResult<Value> {
    let issued = invitation_service::create(&state, &ctx, payload).await?;
    Ok(ApiResponse::created(json!({
        "invitation": issued.invitation,
        "token": issued.token,
    })))
}

/// DELETE /api/organization/invitations/:id (Admin+)
pub async fn invitation_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Invitation> {
    Ok(ApiResponse::success(invitation_service::cancel(&state, &ctx, id).await?))
}
