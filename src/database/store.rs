use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    AuditLogEntry, EntityKind, Invitation, InvitationStatus, Membership, Organization, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Missing configuration: {0}")]
    Config(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Storage envelope of a tenant-scoped row. The typed entity lives in `data`;
/// `organization_id` and `unique_key` are lifted out so the store can filter
/// and enforce per-organization uniqueness without knowing the entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: EntityKind,
    pub unique_key: Option<String>,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence seam shared by the HTTP handlers, the services and the CLI.
///
/// Tenant rows are only reachable through `fetch_record` (by id, unfiltered;
/// ownership is checked by the caller's scope) and the organization-filtered
/// `list_records` / `find_record_by_key`.
#[async_trait]
pub trait Store: Send + Sync {
    // Organizations
    async fn insert_organization(&self, org: &Organization) -> Result<(), StoreError>;
    async fn update_organization(&self, org: &Organization) -> Result<(), StoreError>;
    async fn organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;
    async fn organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, StoreError>;
    /// Ordered by name.
    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError>;

    // Users
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    // Memberships
    /// Inserts or replaces the role for `(user_id, organization_id)`.
    async fn upsert_membership(&self, membership: &Membership) -> Result<(), StoreError>;
    async fn membership(&self, user_id: Uuid, organization_id: Uuid) -> Result<Option<Membership>, StoreError>;
    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<Membership>, StoreError>;
    async fn memberships_for_organization(&self, organization_id: Uuid) -> Result<Vec<Membership>, StoreError>;
    async fn delete_membership(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, StoreError>;

    // Invitations
    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), StoreError>;
    /// Writes `status` and `accepted_at` only if the stored status is still
    /// `expected`. Returns whether the row changed.
    async fn transition_invitation(&self, invitation: &Invitation, expected: InvitationStatus) -> Result<bool, StoreError>;
    async fn invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError>;
    async fn invitation_by_token(&self, token_hash: &str) -> Result<Option<Invitation>, StoreError>;
    async fn invitations_for_organization(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError>;

    // Tenant-scoped rows
    async fn fetch_record(&self, kind: EntityKind, id: Uuid) -> Result<Option<StoredRecord>, StoreError>;
    /// Rows of one organization, oldest first.
    async fn list_records(&self, kind: EntityKind, organization_id: Uuid) -> Result<Vec<StoredRecord>, StoreError>;
    async fn find_record_by_key(
        &self,
        kind: EntityKind,
        organization_id: Uuid,
        key: &str,
    ) -> Result<Option<StoredRecord>, StoreError>;
    async fn insert_record(&self, record: &StoredRecord) -> Result<(), StoreError>;
    async fn update_record(&self, record: &StoredRecord) -> Result<(), StoreError>;
    async fn delete_record(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError>;

    // Audit
    async fn append_audit(&self, entry: &AuditLogEntry) -> Result<(), StoreError>;
    /// Newest first.
    async fn audit_for_organization(&self, organization_id: Uuid, limit: usize) -> Result<Vec<AuditLogEntry>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

impl StoreError {
    /// Maps PostgreSQL unique violations onto `UniqueViolation`.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Sqlx(err)
    }
}
