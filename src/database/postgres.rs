use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::models::{
    AuditLogEntry, EntityKind, Invitation, InvitationStatus, Membership, Organization, User,
};
use crate::database::store::{Store, StoreError, StoredRecord};

/// PostgreSQL-backed store. Tenant tables are addressed by `EntityKind::table()`,
/// which only ever yields fixed identifiers.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{}: {}", field, err))
}

fn membership_from_row(row: &PgRow) -> Result<Membership, StoreError> {
    let role: String = row.try_get("role")?;
    Ok(Membership {
        user_id: row.try_get("user_id")?,
        organization_id: row.try_get("organization_id")?,
        role: role.parse().map_err(|e| corrupt("memberships.role", e))?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn invitation_from_row(row: &PgRow) -> Result<Invitation, StoreError> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    Ok(Invitation {
        id: row.try_get("id")?,
        organization_id: row.try_get("organization_id")?,
        email: row.try_get("email")?,
        role: role.parse().map_err(|e| corrupt("invitations.role", e))?,
        token_hash: row.try_get("token_hash")?,
        status: status.parse().map_err(|e| corrupt("invitations.status", e))?,
        invited_by: row.try_get("invited_by")?,
        expires_at: row.try_get("expires_at")?,
        accepted_at: row.try_get("accepted_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn audit_from_row(row: &PgRow) -> Result<AuditLogEntry, StoreError> {
    let action: String = row.try_get("action")?;
    Ok(AuditLogEntry {
        id: row.try_get("id")?,
        organization_id: row.try_get("organization_id")?,
        user_id: row.try_get("user_id")?,
        action: action.parse().map_err(|e| corrupt("audit_log.action", e))?,
        entity: row.try_get("entity")?,
        object_id: row.try_get("object_id")?,
        changes: row.try_get("changes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn record_from_row(kind: EntityKind, row: &PgRow) -> Result<StoredRecord, StoreError> {
    Ok(StoredRecord {
        id: row.try_get("id")?,
        organization_id: row.try_get("organization_id")?,
        kind,
        unique_key: row.try_get("unique_key")?,
        data: row.try_get("data")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const ORGANIZATION_COLUMNS: &str = "id, name, slug, siret, vat_number, address, postal_code, city, country, \
     phone, email, website, iban, bic, primary_color, timezone, currency, locale, is_active, \
     trial_ends_at, created_at, updated_at";

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, job_title, \
     home_organization_id, active_organization_id, is_super_admin, is_active, is_2fa_enabled, \
     created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    async fn insert_organization(&self, org: &Organization) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO organizations ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)",
            ORGANIZATION_COLUMNS
        ))
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.slug)
        .bind(&org.siret)
        .bind(&org.vat_number)
        .bind(&org.address)
        .bind(&org.postal_code)
        .bind(&org.city)
        .bind(&org.country)
        .bind(&org.phone)
        .bind(&org.email)
        .bind(&org.website)
        .bind(&org.iban)
        .bind(&org.bic)
        .bind(&org.primary_color)
        .bind(&org.timezone)
        .bind(&org.currency)
        .bind(&org.locale)
        .bind(org.is_active)
        .bind(org.trial_ends_at)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update_organization(&self, org: &Organization) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE organizations SET name = $2, siret = $3, vat_number = $4, address = $5, \
             postal_code = $6, city = $7, country = $8, phone = $9, email = $10, website = $11, \
             iban = $12, bic = $13, primary_color = $14, timezone = $15, currency = $16, \
             locale = $17, is_active = $18, trial_ends_at = $19, updated_at = $20 WHERE id = $1",
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.siret)
        .bind(&org.vat_number)
        .bind(&org.address)
        .bind(&org.postal_code)
        .bind(&org.city)
        .bind(&org.country)
        .bind(&org.phone)
        .bind(&org.email)
        .bind(&org.website)
        .bind(&org.iban)
        .bind(&org.bic)
        .bind(&org.primary_color)
        .bind(&org.timezone)
        .bind(&org.currency)
        .bind(&org.locale)
        .bind(org.is_active)
        .bind(org.trial_ends_at)
        .bind(org.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        let org = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations WHERE id = $1",
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    async fn organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, StoreError> {
        let org = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations WHERE slug = $1",
            ORGANIZATION_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let orgs = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations ORDER BY name, created_at",
            ORGANIZATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(orgs)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.job_title)
        .bind(user.home_organization_id)
        .bind(user.active_organization_id)
        .bind(user.is_super_admin)
        .bind(user.is_active)
        .bind(user.is_2fa_enabled)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, first_name = $3, last_name = $4, phone = $5, \
             job_title = $6, home_organization_id = $7, active_organization_id = $8, \
             is_super_admin = $9, is_active = $10, is_2fa_enabled = $11, updated_at = $12 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.job_title)
        .bind(user.home_organization_id)
        .bind(user.active_organization_id)
        .bind(user.is_super_admin)
        .bind(user.is_active)
        .bind(user.is_2fa_enabled)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY email", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn upsert_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO memberships (user_id, organization_id, role, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, organization_id) \
             DO UPDATE SET role = EXCLUDED.role, is_active = EXCLUDED.is_active",
        )
        .bind(membership.user_id)
        .bind(membership.organization_id)
        .bind(membership.role.as_str())
        .bind(membership.is_active)
        .bind(membership.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn membership(&self, user_id: Uuid, organization_id: Uuid) -> Result<Option<Membership>, StoreError> {
        let row = sqlx::query("SELECT * FROM memberships WHERE user_id = $1 AND organization_id = $2")
            .bind(user_id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(membership_from_row).transpose()
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<Membership>, StoreError> {
        let rows = sqlx::query("SELECT * FROM memberships WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(membership_from_row).collect()
    }

    async fn memberships_for_organization(&self, organization_id: Uuid) -> Result<Vec<Membership>, StoreError> {
        let rows = sqlx::query("SELECT * FROM memberships WHERE organization_id = $1 ORDER BY created_at")
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(membership_from_row).collect()
    }

    async fn delete_membership(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM memberships WHERE user_id = $1 AND organization_id = $2")
            .bind(user_id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO invitations (id, organization_id, email, role, token_hash, status, invited_by, \
             expires_at, accepted_at, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(invitation.id)
        .bind(invitation.organization_id)
        .bind(&invitation.email)
        .bind(invitation.role.as_str())
        .bind(&invitation.token_hash)
        .bind(invitation.status.as_str())
        .bind(invitation.invited_by)
        .bind(invitation.expires_at)
        .bind(invitation.accepted_at)
        .bind(invitation.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn transition_invitation(&self, invitation: &Invitation, expected: InvitationStatus) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE invitations SET status = $2, accepted_at = $3 WHERE id = $1 AND status = $4")
            .bind(invitation.id)
            .bind(invitation.status.as_str())
            .bind(invitation.accepted_at)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        let row = sqlx::query("SELECT * FROM invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(invitation_from_row).transpose()
    }

    async fn invitation_by_token(&self, token_hash: &str) -> Result<Option<Invitation>, StoreError> {
        let row = sqlx::query("SELECT * FROM invitations WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(invitation_from_row).transpose()
    }

    async fn invitations_for_organization(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        let rows = sqlx::query("SELECT * FROM invitations WHERE organization_id = $1 ORDER BY created_at DESC")
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(invitation_from_row).collect()
    }

    async fn fetch_record(&self, kind: EntityKind, id: Uuid) -> Result<Option<StoredRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT * FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(|r| record_from_row(kind, r)).transpose()
    }

    async fn list_records(&self, kind: EntityKind, organization_id: Uuid) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT * FROM {} WHERE organization_id = $1 ORDER BY created_at",
            kind.table()
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|r| record_from_row(kind, r)).collect()
    }

    async fn find_record_by_key(
        &self,
        kind: EntityKind,
        organization_id: Uuid,
        key: &str,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT * FROM {} WHERE organization_id = $1 AND unique_key = $2",
            kind.table()
        ))
        .bind(organization_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(|r| record_from_row(kind, r)).transpose()
    }

    async fn insert_record(&self, record: &StoredRecord) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO {} (id, organization_id, unique_key, data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            record.kind.table()
        ))
        .bind(record.id)
        .bind(record.organization_id)
        .bind(&record.unique_key)
        .bind(&record.data)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update_record(&self, record: &StoredRecord) -> Result<(), StoreError> {
        // organization_id is never rewritten.
        sqlx::query(&format!(
            "UPDATE {} SET unique_key = $2, data = $3, updated_at = $4 WHERE id = $1",
            record.kind.table()
        ))
        .bind(record.id)
        .bind(&record.unique_key)
        .bind(&record.data)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn delete_record(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_audit(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_log (id, organization_id, user_id, action, entity, object_id, changes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(entry.organization_id)
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.entity)
        .bind(&entry.object_id)
        .bind(&entry.changes)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn audit_for_organization(&self, organization_id: Uuid, limit: usize) -> Result<Vec<AuditLogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM audit_log WHERE organization_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(organization_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
