use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::config::TenancyConfig;
use crate::tenancy::error::TenancyError;

/// A tenant. Every business row hangs off exactly one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,

    // Legal and billing
    pub siret: String,
    pub vat_number: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub iban: String,
    pub bic: String,

    // Branding and locale
    pub primary_color: String,
    pub timezone: String,
    pub currency: String,
    pub locale: String,

    pub is_active: bool,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub const DEFAULT_COLOR: &'static str = "#3B82F6";

    pub fn new(name: &str, slug: &str, defaults: &TenancyConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            slug: slug.to_string(),
            siret: String::new(),
            vat_number: String::new(),
            address: String::new(),
            postal_code: String::new(),
            city: String::new(),
            country: defaults.default_country.clone(),
            phone: String::new(),
            email: String::new(),
            website: String::new(),
            iban: String::new(),
            bic: String::new(),
            primary_color: Self::DEFAULT_COLOR.to_string(),
            timezone: defaults.default_timezone.clone(),
            currency: defaults.default_currency.clone(),
            locale: defaults.default_locale.clone(),
            is_active: true,
            trial_ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_trial_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.trial_ends_at, Some(ends) if now > ends)
    }
}

/// Partial update of an organization's settings. Absent fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationSettings {
    pub name: Option<String>,
    pub siret: Option<String>,
    pub vat_number: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub primary_color: Option<String>,
    pub timezone: Option<String>,
    pub currency: Option<String>,
    pub locale: Option<String>,
}

impl OrganizationSettings {
    pub fn validate(&self) -> Result<(), TenancyError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(TenancyError::validation("organization name cannot be empty"));
            }
        }
        if let Some(color) = &self.primary_color {
            let hex = color.strip_prefix('#').unwrap_or("");
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(TenancyError::validation(format!("invalid colour '{}', expected #RRGGBB", color)));
            }
        }
        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(TenancyError::validation(format!("invalid currency code '{}'", currency)));
            }
        }
        if let Some(siret) = &self.siret {
            if !siret.is_empty() && (siret.len() != 14 || !siret.chars().all(|c| c.is_ascii_digit())) {
                return Err(TenancyError::validation("SIRET must be 14 digits"));
            }
        }
        if let Some(email) = &self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(TenancyError::validation(format!("invalid email '{}'", email)));
            }
        }
        Ok(())
    }

    pub fn apply(self, org: &mut Organization) {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(v) = value {
                *target = v.trim().to_string();
            }
        }

        set(&mut org.name, self.name);
        set(&mut org.siret, self.siret);
        set(&mut org.vat_number, self.vat_number);
        set(&mut org.address, self.address);
        set(&mut org.postal_code, self.postal_code);
        set(&mut org.city, self.city);
        set(&mut org.country, self.country);
        set(&mut org.phone, self.phone);
        set(&mut org.email, self.email);
        set(&mut org.website, self.website);
        set(&mut org.iban, self.iban);
        set(&mut org.bic, self.bic);
        set(&mut org.primary_color, self.primary_color);
        set(&mut org.timezone, self.timezone);
        set(&mut org.currency, self.currency);
        set(&mut org.locale, self.locale);
        org.updated_at = Utc::now();
    }
}
