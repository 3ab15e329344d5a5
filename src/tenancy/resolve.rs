//! Active-organization resolution and switching.
//!
//! Precedence at login / per request: the stored `active_organization_id` if
//! still accessible, then `home_organization_id` if accessible, then the first
//! accessible *active* organization by name, otherwise none. "Accessible"
//! means an active membership, or any organization for a super administrator.

use chrono::Utc;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{AuditAction, AuditLogEntry, Organization, User};
use crate::permissions::Role;
use crate::services::audit;
use crate::tenancy::error::TenancyError;
use crate::tenancy::session::{OrgContext, SessionState};

/// An organization the user may act in, with their role there if any.
#[derive(Debug, Clone)]
pub struct Accessible {
    pub organization: Organization,
    pub role: Option<Role>,
}

/// Ordered by organization name.
pub async fn accessible_organizations(state: &AppState, user: &User) -> Result<Vec<Accessible>, TenancyError> {
    let memberships = state.store.memberships_for_user(user.id).await?;

    let mut found = Vec::new();
    if user.is_super_admin {
        for organization in state.store.list_organizations().await? {
            let role = memberships
                .iter()
                .find(|m| m.organization_id == organization.id && m.is_active)
                .map(|m| m.role);
            found.push(Accessible { organization, role });
        }
        return Ok(found);
    }

    for membership in memberships.into_iter().filter(|m| m.is_active) {
        if let Some(organization) = state.store.organization(membership.organization_id).await? {
            found.push(Accessible {
                organization,
                role: Some(membership.role),
            });
        }
    }
    found.sort_by(|a, b| a.organization.name.cmp(&b.organization.name));
    Ok(found)
}

/// Applies the resolution precedence to an already loaded accessible list.
pub fn pick_active<'a>(user: &User, accessible: &'a [Accessible]) -> Option<&'a Accessible> {
    let by_id = |id: Option<Uuid>| id.and_then(|id| accessible.iter().find(|a| a.organization.id == id));

    by_id(user.active_organization_id)
        .or_else(|| by_id(user.home_organization_id))
        .or_else(|| accessible.iter().find(|a| a.organization.is_active))
}

fn context(state: &AppState, user: User, chosen: &Accessible) -> OrgContext {
    OrgContext {
        user,
        organization: chosen.organization.clone(),
        role: chosen.role,
        policy: state.config.tenancy.deactivated_policy,
    }
}

/// Resolves the session of an authenticated user. Persists the chosen
/// organization when it differs from the stored selection.
pub async fn resolve_session(state: &AppState, mut user: User) -> Result<SessionState, TenancyError> {
    let accessible = accessible_organizations(state, &user).await?;

    let Some(chosen) = pick_active(&user, &accessible) else {
        if user.active_organization_id.take().is_some() {
            user.updated_at = Utc::now();
            state.store.update_user(&user).await?;
        }
        return Ok(SessionState::Authenticated { user });
    };

    if user.active_organization_id != Some(chosen.organization.id) {
        tracing::debug!(
            "Resolved active organization {} for user {}",
            chosen.organization.slug,
            user.email
        );
        user.active_organization_id = Some(chosen.organization.id);
        user.updated_at = Utc::now();
        state.store.update_user(&user).await?;
    }

    Ok(SessionState::Active(context(state, user, chosen)))
}

/// Switches the user's active organization. On failure the stored selection
/// is left untouched.
pub async fn switch_organization(
    state: &AppState,
    mut user: User,
    organization_id: Uuid,
) -> Result<OrgContext, TenancyError> {
    let accessible = accessible_organizations(state, &user).await?;
    let Some(target) = accessible.iter().find(|a| a.organization.id == organization_id) else {
        tracing::warn!(
            "User {} attempted to switch to organization {} without membership",
            user.email,
            organization_id
        );
        return Err(TenancyError::NotMember(organization_id));
    };

    let previous = user.active_organization_id;
    user.active_organization_id = Some(organization_id);
    user.updated_at = Utc::now();
    state.store.update_user(&user).await?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Switch, "organization", organization_id)
            .in_organization(organization_id)
            .by(user.id)
            .with_changes(serde_json::json!({ "from": previous, "to": organization_id })),
    )
    .await;

    tracing::info!("User {} switched to organization {}", user.email, target.organization.slug);
    Ok(context(state, user, target))
}
