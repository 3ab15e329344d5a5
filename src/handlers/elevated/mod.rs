// handlers/elevated/mod.rs - Elevated handlers (super administrators only)
//
// Middleware: jwt_auth_middleware → resolve_session_middleware →
// super_admin_middleware. Handlers here act across organizations and take the
// target organization from the path, never from the session.

pub mod root; // /api/root/*
