pub mod audit;
pub mod company;
pub mod contact;
pub mod employee;
pub mod invitation;
pub mod invoice;
pub mod membership;
pub mod organization;
pub mod product;
pub mod user;

pub use audit::{AuditAction, AuditLogEntry};
pub use company::Company;
pub use contact::Contact;
pub use employee::Employee;
pub use invitation::{Invitation, InvitationStatus};
pub use invoice::{Invoice, InvoiceStatus};
pub use membership::{MemberView, Membership};
pub use organization::{Organization, OrganizationSettings};
pub use product::{Product, ProductLookup};
pub use user::{User, UserView};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::permissions::Module;

/// The tenant-scoped business entities. Each kind maps to its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Company,
    Contact,
    Product,
    Invoice,
    Employee,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Company,
        EntityKind::Contact,
        EntityKind::Product,
        EntityKind::Invoice,
        EntityKind::Employee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Contact => "contact",
            EntityKind::Product => "product",
            EntityKind::Invoice => "invoice",
            EntityKind::Employee => "employee",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Company => "companies",
            EntityKind::Contact => "contacts",
            EntityKind::Product => "products",
            EntityKind::Invoice => "invoices",
            EntityKind::Employee => "employees",
        }
    }

    /// Business module whose permissions gate this entity.
    pub const fn module(&self) -> Module {
        match self {
            EntityKind::Company | EntityKind::Contact => Module::Crm,
            EntityKind::Product | EntityKind::Invoice => Module::Invoicing,
            EntityKind::Employee => Module::Hr,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown entity kind '{}'", s))
    }
}

/// Trims and drops empty strings so optional text fields stay `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_names() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("order".parse::<EntityKind>().is_err());
    }

    #[test]
    fn kinds_map_to_modules() {
        assert_eq!(EntityKind::Contact.module(), Module::Crm);
        assert_eq!(EntityKind::Invoice.module(), Module::Invoicing);
        assert_eq!(EntityKind::Employee.module(), Module::Hr);
    }
}
