// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::handlers::session_json;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::account_service;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - Verify credentials and receive a JWT
///
/// The response carries the resolved session. `session.organization` is null
/// when the user has no accessible organization yet.
pub async fn login_post(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let outcome = account_service::authenticate(&state, &payload.email, &payload.password).await?;

    let mut data = serde_json::json!({
        "token": outcome.token,
        "expires_in": outcome.expires_in,
    });
    data["session"] = session_json(&outcome.session);
    Ok(ApiResponse::success(data))
}
