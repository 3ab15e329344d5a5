use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::database::store::StoreError;
use crate::permissions::Role;

/// Failures of the organization isolation layer and the services built on it.
#[derive(Debug, Error)]
pub enum TenancyError {
    /// A tenant-scoped write was attempted without a resolvable organization.
    /// This is a wiring bug, not a user error.
    #[error("no active organization resolved for this operation")]
    MissingOrganization,

    #[error("an active organization must be selected")]
    OrganizationRequired,

    #[error("{entity} {id} belongs to another organization")]
    CrossTenant { entity: &'static str, id: Uuid },

    #[error("organization '{0}' is deactivated")]
    OrganizationInactive(String),

    #[error("role '{required}' or higher is required")]
    InsufficientRank { required: Role, actual: Option<Role> },

    #[error("permission '{0}' is required")]
    MissingPermission(String),

    #[error("not a member of organization {0}")]
    NotMember(Uuid),

    #[error("super administrator access required")]
    SuperAdminRequired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TenancyError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        TenancyError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        TenancyError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        TenancyError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        TenancyError::Forbidden(message.into())
    }
}
