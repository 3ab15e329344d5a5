use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    AuditLogEntry, EntityKind, Invitation, InvitationStatus, Membership, Organization, User,
};
use crate::database::store::{Store, StoreError, StoredRecord};

/// In-process store used by tests and `BIZHUB_STORE=memory`.
/// Enforces the same uniqueness rules as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    organizations: RwLock<HashMap<Uuid, Organization>>,
    users: RwLock<HashMap<Uuid, User>>,
    memberships: RwLock<HashMap<(Uuid, Uuid), Membership>>,
    invitations: RwLock<HashMap<Uuid, Invitation>>,
    records: RwLock<HashMap<(EntityKind, Uuid), StoredRecord>>,
    audit: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key_taken(
    records: &HashMap<(EntityKind, Uuid), StoredRecord>,
    candidate: &StoredRecord,
) -> bool {
    let Some(key) = candidate.unique_key.as_deref() else {
        return false;
    };
    records.values().any(|r| {
        r.kind == candidate.kind
            && r.id != candidate.id
            && r.organization_id == candidate.organization_id
            && r.unique_key.as_deref() == Some(key)
    })
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_organization(&self, org: &Organization) -> Result<(), StoreError> {
        let mut orgs = self.organizations.write().await;
        if orgs.values().any(|o| o.slug == org.slug) {
            return Err(StoreError::UniqueViolation("organizations_slug_key".into()));
        }
        orgs.insert(org.id, org.clone());
        Ok(())
    }

    async fn update_organization(&self, org: &Organization) -> Result<(), StoreError> {
        self.organizations.write().await.insert(org.id, org.clone());
        Ok(())
    }

    async fn organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.read().await.get(&id).cloned())
    }

    async fn organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.read().await.values().find(|o| o.slug == slug).cloned())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let mut orgs: Vec<_> = self.organizations.read().await.values().cloned().collect();
        orgs.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(orgs)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<_> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn upsert_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        let mut memberships = self.memberships.write().await;
        let key = (membership.user_id, membership.organization_id);
        match memberships.get_mut(&key) {
            Some(existing) => {
                existing.role = membership.role;
                existing.is_active = membership.is_active;
            }
            None => {
                memberships.insert(key, membership.clone());
            }
        }
        Ok(())
    }

    async fn membership(&self, user_id: Uuid, organization_id: Uuid) -> Result<Option<Membership>, StoreError> {
        Ok(self.memberships.read().await.get(&(user_id, organization_id)).cloned())
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<Membership>, StoreError> {
        let mut found: Vec<_> = self
            .memberships
            .read()
            .await
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn memberships_for_organization(&self, organization_id: Uuid) -> Result<Vec<Membership>, StoreError> {
        let mut found: Vec<_> = self
            .memberships
            .read()
            .await
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn delete_membership(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.memberships.write().await.remove(&(user_id, organization_id)).is_some())
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), StoreError> {
        self.invitations.write().await.insert(invitation.id, invitation.clone());
        Ok(())
    }

    async fn transition_invitation(&self, invitation: &Invitation, expected: InvitationStatus) -> Result<bool, StoreError> {
        let mut invitations = self.invitations.write().await;
        match invitations.get_mut(&invitation.id) {
            Some(stored) if stored.status == expected => {
                stored.status = invitation.status;
                stored.accepted_at = invitation.accepted_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        Ok(self.invitations.read().await.get(&id).cloned())
    }

    async fn invitation_by_token(&self, token_hash: &str) -> Result<Option<Invitation>, StoreError> {
        Ok(self
            .invitations
            .read()
            .await
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn invitations_for_organization(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        let mut found: Vec<_> = self
            .invitations
            .read()
            .await
            .values()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn fetch_record(&self, kind: EntityKind, id: Uuid) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.records.read().await.get(&(kind, id)).cloned())
    }

    async fn list_records(&self, kind: EntityKind, organization_id: Uuid) -> Result<Vec<StoredRecord>, StoreError> {
        let mut found: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.kind == kind && r.organization_id == organization_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }

    async fn find_record_by_key(
        &self,
        kind: EntityKind,
        organization_id: Uuid,
        key: &str,
    ) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.kind == kind && r.organization_id == organization_id && r.unique_key.as_deref() == Some(key))
            .cloned())
    }

    async fn insert_record(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if key_taken(&records, record) {
            return Err(StoreError::UniqueViolation(format!("{}_org_key", record.kind.table())));
        }
        records.insert((record.kind, record.id), record.clone());
        Ok(())
    }

    async fn update_record(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if key_taken(&records, record) {
            return Err(StoreError::UniqueViolation(format!("{}_org_key", record.kind.table())));
        }
        records.insert((record.kind, record.id), record.clone());
        Ok(())
    }

    async fn delete_record(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(&(kind, id)).is_some())
    }

    async fn append_audit(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        self.audit.write().await.push(entry.clone());
        Ok(())
    }

    async fn audit_for_organization(&self, organization_id: Uuid, limit: usize) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self
            .audit
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.organization_id == Some(organization_id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
