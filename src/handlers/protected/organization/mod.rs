// handlers/protected/organization/mod.rs - Active organization management
//
// Every handler here receives the `OrgContext` injected by the organization
// gate and only ever touches that organization.

pub mod audit; // GET /api/organization/audit
pub mod deactivate; // POST /api/organization/deactivate
pub mod invitations; // GET|POST /api/organization/invitations, DELETE .../:id
pub mod members; // GET /api/organization/members, PUT|DELETE .../:user_id
pub mod show; // GET /api/organization
pub mod update; // PATCH /api/organization

pub use audit::audit_get;
pub use deactivate::deactivate_post;
pub use invitations::{invitation_delete, invitations_get, invitations_post};
pub use members::{member_delete, member_put, members_get};
pub use show::show_get;
pub use update::update_patch;
