pub mod memberships;
pub mod migrate;
pub mod org;
pub mod permissions;
pub mod superuser;
