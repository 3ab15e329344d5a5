use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{clean, EntityKind};
use crate::tenancy::error::TenancyError;
use crate::tenancy::scope::TenantScoped;

/// A catalogue item. `reference` is unique within an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub reference: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub unit: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn default_vat_rate() -> Decimal {
    Decimal::from(20)
}

fn default_unit() -> String {
    "unit".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price: Decimal,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub reference: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub unit: Option<String>,
    pub is_active: Option<bool>,
}

/// What the invoice editor needs to prefill a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLookup {
    pub id: Uuid,
    pub reference: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub unit: String,
    pub unit_price_ttc: Decimal,
}

impl Product {
    /// Unit price including VAT, rounded to cents. `None` on overflow.
    pub fn unit_price_ttc(&self) -> Option<Decimal> {
        let vat = self.unit_price.checked_mul(self.vat_rate)?.checked_div(Decimal::from(100))?;
        Some(self.unit_price.checked_add(vat)?.round_dp(2))
    }

    fn validate(&self) -> Result<(), TenancyError> {
        if self.reference.is_empty() {
            return Err(TenancyError::validation("product reference is required"));
        }
        if self.name.is_empty() {
            return Err(TenancyError::validation("product name is required"));
        }
        if self.unit_price.is_sign_negative() {
            return Err(TenancyError::validation("unit price cannot be negative"));
        }
        if self.vat_rate < Decimal::ZERO || self.vat_rate > Decimal::from(100) {
            return Err(TenancyError::validation("VAT rate must be between 0 and 100"));
        }
        if self.unit_price_ttc().is_none() {
            return Err(TenancyError::validation("unit price is out of range"));
        }
        Ok(())
    }
}

impl TryFrom<&Product> for ProductLookup {
    type Error = TenancyError;

    fn try_from(product: &Product) -> Result<Self, TenancyError> {
        let unit_price_ttc = product
            .unit_price_ttc()
            .ok_or_else(|| TenancyError::validation("unit price is out of range"))?;
        Ok(Self {
            id: product.id,
            reference: product.reference.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            unit_price: product.unit_price,
            vat_rate: product.vat_rate,
            unit: product.unit.clone(),
            unit_price_ttc,
        })
    }
}

impl TenantScoped for Product {
    const KIND: EntityKind = EntityKind::Product;
    type Input = ProductInput;
    type Patch = ProductPatch;

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

    fn build(id: Uuid, organization_id: Uuid, input: ProductInput, now: DateTime<Utc>) -> Result<Self, TenancyError> {
        let product = Self {
            id,
            organization_id,
            reference: input.reference.trim().to_string(),
            name: input.name.trim().to_string(),
            description: clean(input.description),
            unit_price: input.unit_price,
            vat_rate: input.vat_rate,
            unit: input.unit.trim().to_string(),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> Result<(), TenancyError> {
        let mut next = self.clone();
        if let Some(v) = patch.reference {
            next.reference = v.trim().to_string();
        }
        if let Some(v) = patch.name {
            next.name = v.trim().to_string();
        }
        if patch.description.is_some() {
            next.description = clean(patch.description);
        }
        if let Some(v) = patch.unit_price {
            next.unit_price = v;
        }
        if let Some(v) = patch.vat_rate {
            next.vat_rate = v;
        }
        if let Some(v) = patch.unit {
            next.unit = v.trim().to_string();
        }
        if let Some(v) = patch.is_active {
            next.is_active = v;
        }
        next.validate()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.reference.clone())
    }
}
