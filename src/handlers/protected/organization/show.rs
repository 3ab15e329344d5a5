// handlers/protected/organization/show.rs - GET /api/organization handler

use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::OrgContext;

pub async fn show_get(Extension(ctx): Extension<OrgContext>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "organization": ctx.organization,
        "role": ctx.role,
        "trial_expired": ctx.organization.is_trial_expired(chrono::Utc::now()),
    })))
}
