// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and service discovery.

pub mod auth; // POST /auth/register, POST /auth/login
pub mod home; // GET /, GET /health
