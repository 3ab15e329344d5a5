// handlers/protected/organizations/list.rs - GET /api/organizations handler

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::handlers::session_user;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenancy::{accessible_organizations, SessionState};

/// GET /api/organizations - Organizations the caller may switch to
///
/// Also the landing page for users without an active organization; an empty
/// list means onboarding.
pub async fn list_get(
    State(state): State<AppState>,
    Extension(session): Extension<SessionState>,
) -> ApiResult<Value> {
    let user = session_user(&session)?;
    let current = session.organization_id();

    let organizations: Vec<Value> = accessible_organizations(&state, &user)
        .await?
        .into_iter()
        .map(|a| {
            json!({
                "id": a.organization.id,
                "name": a.organization.name,
                "slug": a.organization.slug,
                "is_active": a.organization.is_active,
                "role": a.role,
                "is_current": Some(a.organization.id) == current,
            })
        })
        .collect();

    Ok(ApiResponse::success(json!({
        "organizations": organizations,
        "current": current,
    })))
}
