// handlers/protected/organizations/create.rs - POST /api/organizations handler

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Organization;
use crate::handlers::session_user;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::organization_service;
use crate::tenancy::SessionState;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

/// POST /api/organizations - Onboarding. The caller becomes Owner and the new
/// organization becomes active.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<SessionState>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> ApiResult<Organization> {
    let mut user = session_user(&session)?;
    let organization = organization_service::create_organization(&state, &mut user, &payload.name).await?;
    Ok(ApiResponse::created(organization))
}
