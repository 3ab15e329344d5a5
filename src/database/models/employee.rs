use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{clean, EntityKind};
use crate::tenancy::error::TenancyError;
use crate::tenancy::scope::TenantScoped;

/// HR record. `employee_number` is unique within an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeInput {
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub salary: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeePatch {
    pub employee_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl Employee {
    fn validate(&self) -> Result<(), TenancyError> {
        if self.employee_number.is_empty() {
            return Err(TenancyError::validation("employee number is required"));
        }
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(TenancyError::validation("employee first and last name are required"));
        }
        if matches!(self.salary, Some(s) if s.is_sign_negative()) {
            return Err(TenancyError::validation("salary cannot be negative"));
        }
        Ok(())
    }
}

impl TenantScoped for Employee {
    const KIND: EntityKind = EntityKind::Employee;
    type Input = EmployeeInput;
    type Patch = EmployeePatch;

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

    fn build(id: Uuid, organization_id: Uuid, input: EmployeeInput, now: DateTime<Utc>) -> Result<Self, TenancyError> {
        let employee = Self {
            id,
            organization_id,
            employee_number: input.employee_number.trim().to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: clean(input.email).map(|e| e.to_lowercase()),
            job_title: clean(input.job_title),
            department: clean(input.department),
            hire_date: input.hire_date,
            salary: input.salary,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        employee.validate()?;
        Ok(employee)
    }

    fn apply(&mut self, patch: EmployeePatch, now: DateTime<Utc>) -> Result<(), TenancyError> {
        let mut next = self.clone();
        if let Some(v) = patch.employee_number {
            next.employee_number = v.trim().to_string();
        }
        if let Some(v) = patch.first_name {
            next.first_name = v.trim().to_string();
        }
        if let Some(v) = patch.last_name {
            next.last_name = v.trim().to_string();
        }
        if patch.email.is_some() {
            next.email = clean(patch.email).map(|e| e.to_lowercase());
        }
        if patch.job_title.is_some() {
            next.job_title = clean(patch.job_title);
        }
        if patch.department.is_some() {
            next.department = clean(patch.department);
        }
        if patch.hire_date.is_some() {
            next.hire_date = patch.hire_date;
        }
        if patch.salary.is_some() {
            next.salary = patch.salary;
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
        Some(self.employee_number.clone())
    }
}
