use uuid::Uuid;

use crate::config::DeactivatedPolicy;
use crate::database::models::{Organization, User};
use crate::database::store::Store;
use crate::permissions::{self, Permission, Role};
use crate::tenancy::error::TenancyError;
use crate::tenancy::scope::{ScopedRepository, TenantScope, TenantScoped};
use crate::types::Operation;

/// Where a request stands in the isolation chain.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No valid bearer token.
    Anonymous,
    /// Known user, no accessible organization selected.
    Authenticated { user: User },
    /// Known user acting inside one organization.
    Active(OrgContext),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated { user } => Some(user),
            SessionState::Active(ctx) => Some(&ctx.user),
        }
    }

    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            SessionState::Active(ctx) => Some(ctx.organization.id),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated { .. } => "authenticated",
            SessionState::Active(_) => "active",
        }
    }
}

/// Explicit per-request tenant context. Handlers reach tenant data only
/// through the repositories this hands out.
#[derive(Debug, Clone)]
pub struct OrgContext {
    pub user: User,
    pub organization: Organization,
    /// `None` for super administrators acting outside their memberships.
    pub role: Option<Role>,
    pub policy: DeactivatedPolicy,
}

impl OrgContext {
    pub fn is_super_admin(&self) -> bool {
        self.user.is_super_admin
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization.id
    }

    pub fn scope(&self) -> TenantScope {
        if self.is_super_admin() {
            TenantScope::unscoped(Some(self.organization.id))
        } else {
            TenantScope::for_organization(self.organization.id)
        }
    }

    pub fn repository<'a, T: TenantScoped>(&self, store: &'a dyn Store) -> ScopedRepository<'a, T> {
        ScopedRepository::new(store, self.scope())
    }

    /// Applies the deactivated-organization policy to `operation`.
    pub fn check_operation(&self, operation: Operation) -> Result<(), TenancyError> {
        if self.organization.is_active || self.is_super_admin() {
            return Ok(());
        }
        match (self.policy, operation.is_write()) {
            (DeactivatedPolicy::ReadOnly, false) => Ok(()),
            _ => {
                tracing::warn!(
                    "Blocked {:?} by user {} on deactivated organization {}",
                    operation,
                    self.user.id,
                    self.organization.slug
                );
                Err(TenancyError::OrganizationInactive(self.organization.slug.clone()))
            }
        }
    }

    pub fn require_rank(&self, required: Role) -> Result<(), TenancyError> {
        permissions::require_rank(self.is_super_admin(), self.role, required)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), TenancyError> {
        permissions::require_permission(self.is_super_admin(), self.role, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TenancyConfig;

    fn context(role: Option<Role>, active: bool, policy: DeactivatedPolicy) -> OrgContext {
        let mut organization = Organization::new("Acme", "acme", &TenancyConfig::default());
        organization.is_active = active;
        OrgContext {
            user: User::new("u@acme.fr", String::new()),
            organization,
            role,
            policy,
        }
    }

    #[test]
    fn read_only_policy_allows_reads_only() {
        let ctx = context(Some(Role::Owner), false, DeactivatedPolicy::ReadOnly);
        assert!(ctx.check_operation(Operation::Select).is_ok());
        assert!(matches!(
            ctx.check_operation(Operation::Create),
            Err(TenancyError::OrganizationInactive(_))
        ));
    }

    #[test]
    fn blocked_policy_rejects_everything() {
        let ctx = context(Some(Role::Owner), false, DeactivatedPolicy::Blocked);
        assert!(ctx.check_operation(Operation::Select).is_err());
        assert!(ctx.check_operation(Operation::Delete).is_err());
    }

    #[test]
    fn super_admin_ignores_policy_and_bypasses_scope() {
        let mut ctx = context(None, false, DeactivatedPolicy::Blocked);
        ctx.user.is_super_admin = true;
        assert!(ctx.check_operation(Operation::Update).is_ok());
        assert!(ctx.scope().bypass);
        assert!(ctx.require_rank(Role::Owner).is_ok());
    }

    #[test]
    fn missing_membership_fails_closed() {
        let ctx = context(None, true, DeactivatedPolicy::ReadOnly);
        assert!(!ctx.scope().bypass);
        for role in Role::ALL {
            assert!(ctx.require_rank(role).is_err());
        }
    }
}
