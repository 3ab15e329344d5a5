use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::tenancy::{resolve_session, SessionState};

use super::auth::AuthUser;

/// Loads the caller and resolves their active organization.
/// Injects `SessionState` into the request; runs after `jwt_auth_middleware`.
pub async fn resolve_session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before session resolution"))?;

    let user = state
        .store
        .user(auth_user.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token subject {} no longer exists", auth_user.user_id);
            ApiError::unauthorized("User no longer exists")
        })?;

    if !user.is_active {
        tracing::warn!("Inactive user {} presented a valid token", user.email);
        return Err(ApiError::unauthorized("User account is inactive"));
    }

    let session = resolve_session(&state, user).await?;
    tracing::debug!(
        "Session for {}: {} (organization {:?})",
        auth_user.email,
        session.label(),
        session.organization_id()
    );

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
