// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::UserView;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::account_service::{self, Registration};

/// POST /auth/register - Create an account, optionally founding an organization
///
/// ```json
/// { "email": "...", "password": "...", "first_name": "...", "last_name": "...",
///   "organization_name": "Acme SARL" }
/// ```
///
/// Without `organization_name` the account starts with no organization; the
/// client is expected to send the user to organization onboarding.
pub async fn register_post(State(state): State<AppState>, Json(payload): Json<Registration>) -> ApiResult<Value> {
    let (user, organization) = account_service::register(&state, payload).await?;

    Ok(ApiResponse::created(json!({
        "user": UserView::from(&user),
        "organization": organization,
    })))
}
