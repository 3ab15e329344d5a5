// handlers/elevated/root/organizations.rs - Cross-organization administration

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Membership, Organization};
use crate::error::ApiError;
use crate::handlers::session_user;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::organization_service;
use crate::tenancy::SessionState;

/// GET /api/root/organizations - Every organization, active or not, with member counts
pub async fn organization_list(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let mut rows = Vec::new();
    for organization in state.store.list_organizations().await? {
        let members = state.store.memberships_for_organization(organization.id).await?.len();
        rows.push(json!({
            "id": organization.id,
            "name": organization.name,
            "slug": organization.slug,
            "is_active": organization.is_active,
            "members": members,
            "created_at": organization.created_at,
        }));
    }
    Ok(ApiResponse::success(rows))
}

/// GET /api/root/organizations/:id
pub async fn organization_show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Value> {
    let organization = state
        .store
        .organization(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("organization not found: {}", id)))?;
    let memberships = state.store.memberships_for_organization(id).await?;

    Ok(ApiResponse::success(json!({
        "organization": organization,
        "memberships": memberships,
    })))
}

/// POST /api/root/organizations/:id/activate
pub async fn organization_activate(
    State(state): State<AppState>,
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Organization> {
    let actor = session_user(&session)?;
    Ok(ApiResponse::success(organization_service::set_active(&state, Some(&actor), id, true).await?))
}

/// POST /api/root/organizations/:id/deactivate
pub async fn organization_deactivate(
    State(state): State<AppState>,
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Organization> {
    let actor = session_user(&session)?;
    Ok(ApiResponse::success(organization_service::set_active(&state, Some(&actor), id, false).await?))
}

#[derive(Debug, Deserialize)]
pub struct AssignAdminRequest {
    pub user_id: Uuid,
}

/// POST /api/root/organizations/:id/admin - Hand an organization to a new
/// administrator; existing owners and admins are demoted to members.
pub async fn organization_admin(
    State(state): State<AppState>,
    Extension(session): Extension<SessionState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignAdminRequest>,
) -> ApiResult<Membership> {
    let actor = session_user(&session)?;
    let membership = organization_service::assign_admin(&state, &actor, id, payload.user_id).await?;
    Ok(ApiResponse::success(membership))
}
