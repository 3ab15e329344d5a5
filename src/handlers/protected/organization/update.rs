// handlers/protected/organization/update.rs - PATCH /api/organization handler

use axum::{extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::{Organization, OrganizationSettings};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::organization_service;
use crate::tenancy::OrgContext;

/// PATCH /api/organization - Update identity, legal and branding settings (Admin+)
pub async fn update_patch(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(settings): Json<OrganizationSettings>,
) -> ApiResult<Organization> {
    let organization = organization_service::update_settings(&state, &ctx, settings).await?;
    Ok(ApiResponse::success(organization))
}
