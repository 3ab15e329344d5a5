use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::default_vat_rate;
use super::{clean, EntityKind};
use crate::tenancy::error::TenancyError;
use crate::tenancy::scope::TenantScoped;

pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;
pub const MAX_PAYMENT_TERMS_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Sent, Paid) | (Draft, Cancelled) | (Sent, Cancelled)
        ) || *self == next
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,
}

impl InvoiceLine {
    /// `None` when the amount does not fit a `Decimal`.
    pub fn total_ht(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    pub fn total_vat(&self) -> Option<Decimal> {
        self.total_ht()?.checked_mul(self.vat_rate)?.checked_div(Decimal::from(100))
    }
}

fn out_of_range() -> TenancyError {
    TenancyError::validation("invoice amounts are out of range")
}

/// An invoice issued to a company. `number` is unique within an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub number: String,
    pub company_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_terms_days: i64,
    pub status: InvoiceStatus,
    pub lines: Vec<InvoiceLine>,
    pub total_ht: Decimal,
    pub total_vat: Decimal,
    pub total_ttc: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceInput {
    pub number: String,
    pub company_id: Uuid,
    #[serde(default)]
    pub contact_id: Option<Uuid>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_terms_days: Option<i64>,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoicePatch {
    pub contact_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub lines: Option<Vec<InvoiceLine>>,
    pub notes: Option<String>,
}

impl Invoice {
    fn recompute_totals(&mut self) -> Result<(), TenancyError> {
        let mut ht = Decimal::ZERO;
        let mut vat = Decimal::ZERO;
        for line in &self.lines {
            ht = line.total_ht().and_then(|t| ht.checked_add(t)).ok_or_else(out_of_range)?;
            vat = line.total_vat().and_then(|t| vat.checked_add(t)).ok_or_else(out_of_range)?;
        }
        self.total_ht = ht.round_dp(2);
        self.total_vat = vat.round_dp(2);
        self.total_ttc = self.total_ht.checked_add(self.total_vat).ok_or_else(out_of_range)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), TenancyError> {
        if self.number.is_empty() {
            return Err(TenancyError::validation("invoice number is required"));
        }
        if self.due_date < self.issue_date {
            return Err(TenancyError::validation("due date cannot precede issue date"));
        }
        for line in &self.lines {
            if line.quantity <= Decimal::ZERO {
                return Err(TenancyError::validation("line quantity must be positive"));
            }
            if line.unit_price.is_sign_negative() {
                return Err(TenancyError::validation("line unit price cannot be negative"));
            }
            if line.vat_rate < Decimal::ZERO || line.vat_rate > Decimal::from(100) {
                return Err(TenancyError::validation("line VAT rate must be between 0 and 100"));
            }
        }
        Ok(())
    }
}

impl TenantScoped for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;
    type Input = InvoiceInput;
    type Patch = InvoicePatch;

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

    fn build(id: Uuid, organization_id: Uuid, input: InvoiceInput, now: DateTime<Utc>) -> Result<Self, TenancyError> {
        let issue_date = input.issue_date.unwrap_or_else(|| now.date_naive());
        let payment_terms_days = input.payment_terms_days.unwrap_or(DEFAULT_PAYMENT_TERMS_DAYS);
        if !(0..=MAX_PAYMENT_TERMS_DAYS).contains(&payment_terms_days) {
            return Err(TenancyError::validation(format!(
                "payment terms must be between 0 and {} days",
                MAX_PAYMENT_TERMS_DAYS
            )));
        }
        let due_date = match input.due_date {
            Some(date) => date,
            None => Duration::try_days(payment_terms_days)
                .and_then(|terms| issue_date.checked_add_signed(terms))
                .ok_or_else(|| TenancyError::validation("due date is out of range"))?,
        };

        let mut invoice = Self {
            id,
            organization_id,
            number: input.number.trim().to_string(),
            company_id: input.company_id,
            contact_id: input.contact_id,
            issue_date,
            due_date,
            payment_terms_days,
            status: InvoiceStatus::Draft,
            lines: input.lines,
            total_ht: Decimal::ZERO,
            total_vat: Decimal::ZERO,
            total_ttc: Decimal::ZERO,
            notes: clean(input.notes),
            created_at: now,
            updated_at: now,
        };
        invoice.validate()?;
        invoice.recompute_totals()?;
        Ok(invoice)
    }

    fn apply(&mut self, patch: InvoicePatch, now: DateTime<Utc>) -> Result<(), TenancyError> {
        let mut next = self.clone();
        if let Some(lines) = patch.lines {
            if self.status != InvoiceStatus::Draft {
                return Err(TenancyError::validation("only draft invoices can change lines"));
            }
            next.lines = lines;
        }
        if let Some(status) = patch.status {
            if !self.status.can_transition_to(status) {
                return Err(TenancyError::validation(format!(
                    "invoice cannot move from {:?} to {:?}",
                    self.status, status
                )));
            }
            next.status = status;
        }
        if let Some(contact_id) = patch.contact_id {
            next.contact_id = Some(contact_id);
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        if patch.notes.is_some() {
            next.notes = clean(patch.notes);
        }
        next.validate()?;
        next.recompute_totals()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.number.clone())
    }

    fn references(&self) -> Vec<(EntityKind, Uuid)> {
        let mut refs = vec![(EntityKind::Company, self.company_id)];
        refs.extend(self.contact_id.map(|id| (EntityKind::Contact, id)));
        refs.extend(self.lines.iter().filter_map(|l| l.product_id).map(|id| (EntityKind::Product, id)));
        refs
    }
}
