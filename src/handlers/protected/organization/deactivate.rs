// handlers/protected/organization/deactivate.rs - POST /api/organization/deactivate handler

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::Organization;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::organization_service;
use crate::tenancy::OrgContext;

/// POST /api/organization/deactivate - Owner only. Data is kept; members fall
/// under the deactivated-organization policy from the next request on.
pub async fn deactivate_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> ApiResult<Organization> {
    let organization = organization_service::deactivate_own(&state, &ctx).await?;
    Ok(ApiResponse::success(organization))
}
