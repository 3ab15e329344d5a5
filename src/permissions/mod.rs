//! Role ranks and the module permission catalogue.
//!
//! Every membership carries exactly one [`Role`]. Ranks are totally ordered
//! (`Member < Manager < Admin < Owner`) and gate both coarse actions
//! (`require_rank`) and the per-module permission codenames
//! (`require_permission`). Super administrators pass every check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tenancy::error::TenancyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Manager,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Manager, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    /// Whether this rank grants `permission` inside its organization.
    pub fn grants(&self, permission: Permission) -> bool {
        use Action::*;
        use Module::*;

        match self {
            Role::Owner | Role::Admin => true,
            Role::Manager => matches!(
                (permission.module, permission.action),
                (Crm | Invoicing | Sales, View | Create | Edit | Export)
                    | (Invoicing, Approve)
                    | (Hr, View | Approve)
            ),
            Role::Member => matches!(
                (permission.module, permission.action),
                (Crm | Invoicing, View | Create | Edit) | (Sales | Hr, View)
            ),
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        Permission::all().into_iter().filter(|p| self.grants(*p)).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TenancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(TenancyError::validation(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Crm,
    Invoicing,
    Sales,
    Hr,
    Settings,
}

impl Module {
    pub const ALL: [Module; 5] = [Module::Crm, Module::Invoicing, Module::Sales, Module::Hr, Module::Settings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Crm => "crm",
            Module::Invoicing => "invoicing",
            Module::Sales => "sales",
            Module::Hr => "hr",
            Module::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Export,
    Approve,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Export,
        Action::Approve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Export => "export",
            Action::Approve => "approve",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission {
    pub module: Module,
    pub action: Action,
}

impl Permission {
    pub const fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }

    /// `crm_view`, `invoicing_approve`, ...
    pub fn codename(&self) -> String {
        format!("{}_{}", self.module.as_str(), self.action.as_str())
    }

    pub fn all() -> Vec<Permission> {
        Module::ALL
            .iter()
            .flat_map(|m| Action::ALL.iter().map(move |a| Permission::new(*m, *a)))
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.module.as_str(), self.action.as_str())
    }
}

/// Succeeds when the caller's rank is at least `required`.
/// A missing membership never passes unless the caller is a super admin.
pub fn require_rank(is_super_admin: bool, role: Option<Role>, required: Role) -> Result<(), TenancyError> {
    if is_super_admin {
        return Ok(());
    }
    match role {
        Some(actual) if actual >= required => Ok(()),
        actual => {
            tracing::warn!("Rank check failed: required {}, actual {:?}", required, actual);
            Err(TenancyError::InsufficientRank { required, actual })
        }
    }
}

pub fn require_permission(
    is_super_admin: bool,
    role: Option<Role>,
    permission: Permission,
) -> Result<(), TenancyError> {
    if is_super_admin {
        return Ok(());
    }
    match role {
        Some(r) if r.grants(permission) => Ok(()),
        actual => {
            tracing::warn!("Permission check failed: {} for role {:?}", permission, actual);
            Err(TenancyError::MissingPermission(permission.codename()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_ordered() {
        assert!(Role::Owner > Role::Admin);
        assert!(Role::Admin > Role::Manager);
        assert!(Role::Manager > Role::Member);
    }

    #[test]
    fn missing_membership_fails_closed_for_every_rank() {
        for rank in Role::ALL {
            assert!(matches!(
                require_rank(false, None, rank),
                Err(TenancyError::InsufficientRank { actual: None, .. })
            ));
        }
    }

    #[test]
    fn super_admin_passes_without_membership() {
        assert!(require_rank(true, None, Role::Owner).is_ok());
        assert!(require_permission(true, None, Permission::new(Module::Hr, Action::Delete)).is_ok());
    }

    #[test]
    fn rank_check_compares_against_required() {
        assert!(require_rank(false, Some(Role::Admin), Role::Manager).is_ok());
        assert!(require_rank(false, Some(Role::Admin), Role::Admin).is_ok());
        assert!(require_rank(false, Some(Role::Manager), Role::Admin).is_err());
    }

    #[test]
    fn member_catalogue_matches_standard_user() {
        let codes: Vec<String> = Role::Member.permissions().iter().map(|p| p.codename()).collect();
        assert_eq!(
            codes,
            vec![
                "crm_view", "crm_create", "crm_edit",
                "invoicing_view", "invoicing_create", "invoicing_edit",
                "sales_view", "hr_view",
            ]
        );
    }

    #[test]
    fn manager_cannot_delete_but_can_approve_invoices() {
        assert!(!Role::Manager.grants(Permission::new(Module::Invoicing, Action::Delete)));
        assert!(Role::Manager.grants(Permission::new(Module::Invoicing, Action::Approve)));
        assert!(!Role::Manager.grants(Permission::new(Module::Settings, Action::Edit)));
        assert_eq!(Role::Owner.permissions().len(), Permission::all().len());
    }

    #[test]
    fn missing_permission_reports_codename() {
        let err = require_permission(false, Some(Role::Member), Permission::new(Module::Crm, Action::Delete))
            .unwrap_err();
        assert!(matches!(err, TenancyError::MissingPermission(ref c) if c == "crm_delete"));
    }

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Owner);
        assert!("root".parse::<Role>().is_err());
    }
}
