use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::tenancy::error::TenancyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Switch,
    Deactivate,
    Activate,
    RoleChange,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Switch => "switch",
            AuditAction::Deactivate => "deactivate",
            AuditAction::Activate => "activate",
            AuditAction::RoleChange => "role_change",
        }
    }
}

impl FromStr for AuditAction {
    type Err = TenancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "create" => AuditAction::Create,
            "update" => AuditAction::Update,
            "delete" => AuditAction::Delete,
            "login" => AuditAction::Login,
            "switch" => AuditAction::Switch,
            "deactivate" => AuditAction::Deactivate,
            "activate" => AuditAction::Activate,
            "role_change" => AuditAction::RoleChange,
            other => return Err(TenancyError::validation(format!("unknown audit action '{}'", other))),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub entity: String,
    pub object_id: String,
    pub changes: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(action: AuditAction, entity: &str, object_id: impl ToString) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id: None,
            user_id: None,
            action,
            entity: entity.to_string(),
            object_id: object_id.to_string(),
            changes: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn in_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_changes(mut self, changes: Value) -> Self {
        self.changes = changes;
        self
    }
}
