//! Organization scoping for business entities.
//!
//! Every tenant-owned type implements [`TenantScoped`]. All reads and writes
//! go through a [`ScopedRepository`], which stamps the scope's organization on
//! new rows and refuses to hand out or touch rows owned by another
//! organization unless the scope bypasses the filter (super administrators).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use uuid::Uuid;

use crate::database::models::EntityKind;
use crate::database::store::{Store, StoreError, StoredRecord};
use crate::permissions::Module;
use crate::tenancy::error::TenancyError;

pub trait TenantScoped: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    const MODULE: Module = Self::KIND.module();

    /// Client-supplied fields for creation. Never carries the organization.
    type Input: DeserializeOwned + Send;
    /// Partial update. Never carries the organization.
    type Patch: DeserializeOwned + Send;

    fn id(&self) -> Uuid;
    fn organization_id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    fn build(id: Uuid, organization_id: Uuid, input: Self::Input, now: DateTime<Utc>) -> Result<Self, TenancyError>;
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> Result<(), TenancyError>;

    /// Business key unique within one organization.
    fn unique_key(&self) -> Option<String> {
        None
    }

    /// Other tenant rows this one points at; all must share its organization.
    fn references(&self) -> Vec<(EntityKind, Uuid)> {
        Vec::new()
    }
}

/// Data-layer organization filter. Built per request from the resolved
/// organization context, or explicitly by background and CLI code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    pub organization_id: Option<Uuid>,
    /// Skip ownership checks on direct-id access.
    pub bypass: bool,
}

impl TenantScope {
    pub fn for_organization(organization_id: Uuid) -> Self {
        Self {
            organization_id: Some(organization_id),
            bypass: false,
        }
    }

    /// Super-admin scope. Lists still require an organization.
    pub fn unscoped(organization_id: Option<Uuid>) -> Self {
        Self {
            organization_id,
            bypass: true,
        }
    }

    pub fn require_organization(&self) -> Result<Uuid, TenancyError> {
        self.organization_id.ok_or(TenancyError::MissingOrganization)
    }

    /// Succeeds when `owner` is visible through this scope.
    pub fn check_owner(&self, entity: &'static str, id: Uuid, owner: Uuid) -> Result<(), TenancyError> {
        if self.bypass || self.organization_id == Some(owner) {
            return Ok(());
        }
        tracing::warn!(
            "Cross-tenant access denied: {} {} owned by {} requested from {:?}",
            entity,
            id,
            owner,
            self.organization_id
        );
        Err(TenancyError::CrossTenant { entity, id })
    }
}

pub fn to_record<T: TenantScoped>(entity: &T) -> Result<StoredRecord, StoreError> {
    Ok(StoredRecord {
        id: entity.id(),
        organization_id: entity.organization_id(),
        kind: T::KIND,
        unique_key: entity.unique_key(),
        data: serde_json::to_value(entity)?,
        created_at: entity.created_at(),
        updated_at: entity.updated_at(),
    })
}

pub fn from_record<T: TenantScoped>(record: StoredRecord) -> Result<T, StoreError> {
    let entity: T = serde_json::from_value(record.data)?;
    if entity.organization_id() != record.organization_id {
        return Err(StoreError::Corrupt(format!(
            "{} {} payload organization differs from row",
            T::KIND,
            record.id
        )));
    }
    Ok(entity)
}

/// Uniform organization-filtered access to one entity type.
pub struct ScopedRepository<'a, T> {
    store: &'a dyn Store,
    scope: TenantScope,
    _entity: PhantomData<T>,
}

impl<'a, T: TenantScoped> ScopedRepository<'a, T> {
    pub fn new(store: &'a dyn Store, scope: TenantScope) -> Self {
        Self {
            store,
            scope,
            _entity: PhantomData,
        }
    }

    pub fn scope(&self) -> TenantScope {
        self.scope
    }

    /// Rows of the scope's organization only.
    pub async fn list(&self) -> Result<Vec<T>, TenancyError> {
        let organization_id = self.scope.require_organization()?;
        let records = self.store.list_records(T::KIND, organization_id).await?;
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            rows.push(from_record(record)?);
        }
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<T, TenancyError> {
        let record = self
            .store
            .fetch_record(T::KIND, id)
            .await?
            .ok_or_else(|| TenancyError::not_found(T::KIND.as_str(), id))?;
        self.scope.check_owner(T::KIND.as_str(), id, record.organization_id)?;
        Ok(from_record(record)?)
    }

    pub async fn create(&self, input: T::Input) -> Result<T, TenancyError> {
        let organization_id = self.scope.require_organization()?;
        let entity = T::build(Uuid::new_v4(), organization_id, input, Utc::now())?;
        self.check_unique(&entity).await?;
        self.check_references(&entity).await?;

        self.store.insert_record(&to_record(&entity)?).await.map_err(unique_conflict)?;
        tracing::debug!("Created {} {} in organization {}", T::KIND, entity.id(), organization_id);
        Ok(entity)
    }

    pub async fn update(&self, id: Uuid, patch: T::Patch) -> Result<T, TenancyError> {
        let mut entity = self.get(id).await?;
        let owner = entity.organization_id();
        entity.apply(patch, Utc::now())?;
        if entity.organization_id() != owner {
            return Err(TenancyError::validation("organization cannot be changed"));
        }
        self.check_unique(&entity).await?;
        self.check_references(&entity).await?;

        self.store.update_record(&to_record(&entity)?).await.map_err(unique_conflict)?;
        Ok(entity)
    }

    /// Returns the deleted row.
    pub async fn delete(&self, id: Uuid) -> Result<T, TenancyError> {
        let entity = self.get(id).await?;
        if !self.store.delete_record(T::KIND, id).await? {
            return Err(TenancyError::not_found(T::KIND.as_str(), id));
        }
        tracing::debug!("Deleted {} {} from organization {}", T::KIND, id, entity.organization_id());
        Ok(entity)
    }

    async fn check_unique(&self, entity: &T) -> Result<(), TenancyError> {
        let Some(key) = entity.unique_key() else {
            return Ok(());
        };
        match self
            .store
            .find_record_by_key(T::KIND, entity.organization_id(), &key)
            .await?
        {
            Some(existing) if existing.id != entity.id() => Err(TenancyError::conflict(format!(
                "{} '{}' already exists in this organization",
                T::KIND,
                key
            ))),
            _ => Ok(()),
        }
    }

    /// Referenced rows must exist and live in the entity's own organization,
    /// whatever the scope. Bypass never links rows across tenants.
    async fn check_references(&self, entity: &T) -> Result<(), TenancyError> {
        for (kind, id) in entity.references() {
            let target = self
                .store
                .fetch_record(kind, id)
                .await?
                .ok_or_else(|| TenancyError::not_found(kind.as_str(), id))?;
            if target.organization_id != entity.organization_id() {
                tracing::warn!(
                    "{} {} references {} {} from another organization",
                    T::KIND,
                    entity.id(),
                    kind,
                    id
                );
                return Err(TenancyError::CrossTenant {
                    entity: kind.as_str(),
                    id,
                });
            }
        }
        Ok(())
    }
}

fn unique_conflict(err: StoreError) -> TenancyError {
    match err {
        StoreError::UniqueViolation(constraint) => {
            TenancyError::conflict(format!("duplicate value violates {}", constraint))
        }
        other => TenancyError::Store(other),
    }
}
