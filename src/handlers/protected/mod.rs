// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Middleware: jwt_auth_middleware → resolve_session_middleware, plus the
// organization gate for `organization` and `records`.

// Session tier: usable without an active organization
pub mod auth; // GET /api/auth/whoami
pub mod invitations; // POST /api/invitations/accept
pub mod organizations; // /api/organizations (list, onboarding, switch)

// Organization tier: require an active organization
pub mod organization; // /api/organization/*
pub mod records; // /api/crm/*, /api/invoicing/*, /api/hr/*
