use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{clean, EntityKind};
use crate::tenancy::error::TenancyError;
use crate::tenancy::scope::TenantScoped;

/// A person in the CRM, optionally attached to a company of the same organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub company_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
    pub company_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

fn check_email(email: Option<String>) -> Result<Option<String>, TenancyError> {
    match clean(email) {
        Some(e) if !e.contains('@') => Err(TenancyError::validation(format!("invalid email '{}'", e))),
        other => Ok(other.map(|e| e.to_lowercase())),
    }
}

impl TenantScoped for Contact {
    const KIND: EntityKind = EntityKind::Contact;
    type Input = ContactInput;
    type Patch = ContactPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn build(id: Uuid, organization_id: Uuid, input: ContactInput, now: DateTime<Utc>) -> Result<Self, TenancyError> {
        let last_name = input.last_name.trim().to_string();
        if last_name.is_empty() {
            return Err(TenancyError::validation("contact last name is required"));
        }
        Ok(Self {
            id,
            organization_id,
            company_id: input.company_id,
            first_name: input.first_name.trim().to_string(),
            last_name,
            email: check_email(input.email)?,
            phone: clean(input.phone),
            job_title: clean(input.job_title),
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: ContactPatch, now: DateTime<Utc>) -> Result<(), TenancyError> {
        if let Some(company_id) = patch.company_id {
            self.company_id = Some(company_id);
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            let last_name = last_name.trim().to_string();
            if last_name.is_empty() {
                return Err(TenancyError::validation("contact last name is required"));
            }
            self.last_name = last_name;
        }
        if patch.email.is_some() {
            self.email = check_email(patch.email)?;
        }
        if patch.phone.is_some() {
            self.phone = clean(patch.phone);
        }
        if patch.job_title.is_some() {
            self.job_title = clean(patch.job_title);
        }
        if patch.notes.is_some() {
            self.notes = clean(patch.notes);
        }
        self.updated_at = now;
        Ok(())
    }

    fn references(&self) -> Vec<(EntityKind, Uuid)> {
        self.company_id.map(|id| (EntityKind::Company, id)).into_iter().collect()
    }
}
