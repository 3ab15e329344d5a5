use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;
use crate::tenancy::{SessionState, TenancyError};
use crate::types::Operation;

/// Gate for organization-scoped routes. Requires an active organization,
/// applies the deactivation policy and injects `OrgContext`.
pub async fn organization_required_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<SessionState>()
        .cloned()
        .unwrap_or(SessionState::Anonymous);

    let ctx = match session {
        SessionState::Active(ctx) => ctx,
        SessionState::Authenticated { user } => {
            tracing::debug!("User {} has no active organization", user.email);
            return Err(TenancyError::OrganizationRequired.into());
        }
        SessionState::Anonymous => return Err(ApiError::unauthorized("Authentication required")),
    };

    ctx.check_operation(Operation::from_method(request.method()))?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Gate for `/api/root/*`.
pub async fn super_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_super_admin = request
        .extensions()
        .get::<SessionState>()
        .and_then(|s| s.user())
        .map(|u| u.is_super_admin);

    match is_super_admin {
        Some(true) => Ok(next.run(request).await),
        Some(false) => {
            tracing::warn!("Non super-admin attempted {}", request.uri().path());
            Err(TenancyError::SuperAdminRequired.into())
        }
        None => Err(ApiError::unauthorized("Authentication required")),
    }
}
