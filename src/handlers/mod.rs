// handlers/mod.rs - Three-tier handler layout
//
// Public (no auth) → Protected (JWT + resolved session) → Elevated (super admin)
//
// Protected routes split further: session routes work without an active
// organization, organization routes sit behind the organization gate and
// receive an `OrgContext`.

pub mod public; // Tier 1: /, /health, /auth/*
pub mod protected; // Tier 2: /api/*
pub mod elevated; // Tier 3: /api/root/*

use serde_json::{json, Value};

use crate::database::models::{User, UserView};
use crate::error::ApiError;
use crate::permissions::Permission;
use crate::tenancy::SessionState;

/// The caller of a session-tier route. The session middleware never lets an
/// anonymous request through, so `None` here is a routing mistake.
pub(crate) fn session_user(session: &SessionState) -> Result<User, ApiError> {
    session
        .user()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

/// Session summary shared by login, whoami and switch responses.
pub(crate) fn session_json(session: &SessionState) -> Value {
    let user = session.user().map(UserView::from);
    let organization = match session {
        SessionState::Active(ctx) => {
            let permissions: Vec<String> = if ctx.is_super_admin() {
                Permission::all().iter().map(Permission::codename).collect()
            } else {
                ctx.role
                    .map(|r| r.permissions().iter().map(Permission::codename).collect())
                    .unwrap_or_default()
            };
            json!({
                "id": ctx.organization.id,
                "name": ctx.organization.name,
                "slug": ctx.organization.slug,
                "is_active": ctx.organization.is_active,
                "role": ctx.role,
                "permissions": permissions,
            })
        }
        _ => Value::Null,
    };

    json!({
        "state": session.label(),
        "user": user,
        "organization": organization,
    })
}
