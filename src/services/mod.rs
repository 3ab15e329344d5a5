// Application services. Each takes the shared state explicitly and returns
// TenancyError; handlers and CLI commands convert as they see fit.

pub mod account_service;
pub mod audit;
pub mod invitation_service;
pub mod membership_service;
pub mod organization_service;
