use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{clean, EntityKind};
use crate::tenancy::error::TenancyError;
use crate::tenancy::scope::TenantScoped;

/// A customer or supplier company in the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub siret: Option<String>,
    pub vat_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub is_client: bool,
    pub is_supplier: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_true")]
    pub is_client: bool,
    #[serde(default)]
    pub is_supplier: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub siret: Option<String>,
    pub vat_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub is_client: Option<bool>,
    pub is_supplier: Option<bool>,
    pub notes: Option<String>,
}

fn check_name(name: &str) -> Result<String, TenancyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TenancyError::validation("company name is required"));
    }
    Ok(name.to_string())
}

impl TenantScoped for Company {
    const KIND: EntityKind = EntityKind::Company;
    type Input = CompanyInput;
    type Patch = CompanyPatch;

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

    fn build(id: Uuid, organization_id: Uuid, input: CompanyInput, now: DateTime<Utc>) -> Result<Self, TenancyError> {
        Ok(Self {
            id,
            organization_id,
            name: check_name(&input.name)?,
            siret: clean(input.siret),
            vat_number: clean(input.vat_number),
            email: clean(input.email),
            phone: clean(input.phone),
            address: clean(input.address),
            postal_code: clean(input.postal_code),
            city: clean(input.city),
            country: clean(input.country),
            is_client: input.is_client,
            is_supplier: input.is_supplier,
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, patch: CompanyPatch, now: DateTime<Utc>) -> Result<(), TenancyError> {
        if let Some(name) = patch.name {
            self.name = check_name(&name)?;
        }
        for (target, value) in [
            (&mut self.siret, patch.siret),
            (&mut self.vat_number, patch.vat_number),
            (&mut self.email, patch.email),
            (&mut self.phone, patch.phone),
            (&mut self.address, patch.address),
            (&mut self.postal_code, patch.postal_code),
            (&mut self.city, patch.city),
            (&mut self.country, patch.country),
            (&mut self.notes, patch.notes),
        ] {
            if value.is_some() {
                *target = clean(value);
            }
        }
        if let Some(v) = patch.is_client {
            self.is_client = v;
        }
        if let Some(v) = patch.is_supplier {
            self.is_supplier = v;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_ignores_client_supplied_organization() {
        let input: CompanyInput = serde_json::from_value(json!({
            "name": "Dupont SARL",
            "organization_id": Uuid::new_v4(),
        }))
        .unwrap();
        let org = Uuid::new_v4();
        let company = Company::build(Uuid::new_v4(), org, input, Utc::now()).unwrap();
        assert_eq!(company.organization_id, org);
        assert!(company.is_client);
    }

    #[test]
    fn blank_name_rejected() {
        let input: CompanyInput = serde_json::from_value(json!({ "name": "  " })).unwrap();
        assert!(Company::build(Uuid::new_v4(), Uuid::new_v4(), input, Utc::now()).is_err());
    }

    #[test]
    fn patch_clears_with_empty_string() {
        let input: CompanyInput = serde_json::from_value(json!({ "name": "A", "city": "Nantes" })).unwrap();
        let mut company = Company::build(Uuid::new_v4(), Uuid::new_v4(), input, Utc::now()).unwrap();
        let patch = CompanyPatch { city: Some(String::new()), ..Default::default() };
        company.apply(patch, Utc::now()).unwrap();
        assert_eq!(company.city, None);
        assert_eq!(company.name, "A");
    }
}
