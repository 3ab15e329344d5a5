// handlers/protected/organization/audit.rs - GET /api/organization/audit handler

use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::AuditLogEntry;
use crate::middleware::{ApiResponse, ApiResult};
use crate::permissions::Role;
use crate::services::audit;
use crate::tenancy::OrgContext;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// GET /api/organization/audit?limit=N - Newest audit entries (Admin+)
pub async fn audit_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Vec<AuditLogEntry>> {
    ctx.require_rank(Role::Admin)?;
    let entries = audit::for_organization(&state, ctx.organization_id(), query.limit).await?;
    Ok(ApiResponse::success(entries))
}
