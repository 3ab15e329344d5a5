// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::store::StoreError;
use crate::tenancy::error::TenancyError;

/// Where clients are sent to pick or create an organization.
pub const ORGANIZATION_SELECTION_PATH: &str = "/api/organizations";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),
    CrossTenant(String),
    OrganizationInactive(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),
    OrganizationRequired(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::CrossTenant(_) => 403,
            ApiError::OrganizationInactive(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::OrganizationRequired(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::CrossTenant(msg) => msg,
            ApiError::OrganizationInactive(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::OrganizationRequired(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::CrossTenant(_) => "CROSS_TENANT",
            ApiError::OrganizationInactive(_) => "ORGANIZATION_INACTIVE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::OrganizationRequired(_) => "ORGANIZATION_REQUIRED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            ApiError::OrganizationRequired(message) => json!({
                "error": true,
                "message": message,
                "code": "ORGANIZATION_REQUIRED",
                "redirect": ORGANIZATION_SELECTION_PATH
            }),
            _ => json!({
                "error": true,
                "message": self.message(),
                "code": self.error_code()
            }),
        }
    }
}

impl ApiError {
    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn organization_required() -> Self {
        ApiError::OrganizationRequired("Select or create an organization to continue".to_string())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<TenancyError> for ApiError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::MissingOrganization => {
                tracing::error!("Tenant-scoped operation reached the data layer without an organization");
                ApiError::internal_server_error("Organization context is not configured")
            }
            TenancyError::OrganizationRequired => ApiError::organization_required(),
            err @ TenancyError::CrossTenant { .. } => {
                ApiError::CrossTenant(format!("Not permitted: {}", err))
            }
            err @ TenancyError::OrganizationInactive(_) => ApiError::OrganizationInactive(err.to_string()),
            err @ (TenancyError::InsufficientRank { .. }
            | TenancyError::MissingPermission(_)
            | TenancyError::NotMember(_)
            | TenancyError::SuperAdminRequired
            | TenancyError::Forbidden(_)) => ApiError::forbidden(err.to_string()),
            err @ TenancyError::NotFound { .. } => ApiError::not_found(err.to_string()),
            TenancyError::Conflict(msg) => ApiError::conflict(msg),
            TenancyError::Validation(msg) => ApiError::validation_error(msg, None),
            TenancyError::Auth(e) => e.into(),
            TenancyError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => {
                ApiError::conflict(format!("Duplicate value violates {}", constraint))
            }
            StoreError::Sqlx(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Store error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) => ApiError::unauthorized(err.to_string()),
            AuthError::InactiveUser => ApiError::forbidden(err.to_string()),
            AuthError::MissingSecret | AuthError::TokenGeneration(_) | AuthError::Hash(_) => {
                tracing::error!("Authentication backend error: {}", err);
                ApiError::internal_server_error("Authentication is unavailable")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn cross_tenant_is_forbidden_not_missing() {
        let err: ApiError = TenancyError::CrossTenant { entity: "invoice", id: Uuid::new_v4() }.into();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "CROSS_TENANT");
    }

    #[test]
    fn organization_required_carries_redirect() {
        let err: ApiError = TenancyError::OrganizationRequired.into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_json()["redirect"], ORGANIZATION_SELECTION_PATH);
    }

    #[test]
    fn store_details_are_not_leaked() {
        let err: ApiError = StoreError::Corrupt("invoices: secret detail".into()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("secret"));
    }
}
