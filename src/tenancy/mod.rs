//! Organization isolation: scoping of tenant rows, per-request session
//! state and active-organization resolution.

pub mod error;
pub mod resolve;
pub mod scope;
pub mod session;

pub use error::TenancyError;
pub use resolve::{accessible_organizations, pick_active, resolve_session, switch_organization, Accessible};
pub use scope::{ScopedRepository, TenantScope, TenantScoped};
pub use session::{OrgContext, SessionState};
