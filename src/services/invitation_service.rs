use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth;
use crate::config::MAX_INVITATION_TTL_DAYS;
use crate::database::models::user::normalize_email;
use crate::database::models::{AuditAction, AuditLogEntry, Invitation, InvitationStatus, Membership, User};
use crate::permissions::Role;
use crate::services::audit;
use crate::tenancy::{OrgContext, TenancyError};

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationRequest {
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Member
}

/// A freshly issued invitation. `token` is only ever returned here; the
/// store keeps its digest.
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub token: String,
}

pub async fn create(state: &AppState, ctx: &OrgContext, request: InvitationRequest) -> Result<IssuedInvitation, TenancyError> {
    ctx.require_rank(Role::Admin)?;
    if request.role == Role::Owner {
        ctx.require_rank(Role::Owner)?;
    }

    let email = normalize_email(&request.email);
    if !email.contains('@') {
        return Err(TenancyError::validation(format!("invalid email '{}'", email)));
    }

    if let Some(existing) = state.store.user_by_email(&email).await? {
        if state.store.membership(existing.id, ctx.organization_id()).await?.is_some() {
            return Err(TenancyError::conflict(format!("{} is already a member", email)));
        }
    }

    let now = Utc::now();
    let pending = state
        .store
        .invitations_for_organization(ctx.organization_id())
        .await?
        .into_iter()
        .any(|i| i.email == email && i.is_open(now));
    if pending {
        return Err(TenancyError::conflict(format!("{} already has a pending invitation", email)));
    }

    let token = auth::generate_opaque_token();
    let ttl_days = state.config.tenancy.invitation_ttl_days.clamp(1, MAX_INVITATION_TTL_DAYS);
    let invitation = Invitation {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id(),
        email,
        role: request.role,
        token_hash: auth::digest_token(&token),
        status: InvitationStatus::Pending,
        invited_by: Some(ctx.user.id),
        expires_at: now + Duration::days(ttl_days),
        accepted_at: None,
        created_at: now,
    };
    state.store.insert_invitation(&invitation).await?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Create, "invitation", invitation.id)
            .in_organization(invitation.organization_id)
            .by(ctx.user.id)
            .with_changes(json!({ "email": invitation.email, "role": invitation.role })),
    )
    .await;

    tracing::info!("Invited {} to {} as {}", invitation.email, ctx.organization.slug, invitation.role);
    Ok(IssuedInvitation { invitation, token })
}

pub async fn list(state: &AppState, ctx: &OrgContext) -> Result<Vec<Invitation>, TenancyError> {
    ctx.require_rank(Role::Admin)?;
    Ok(state.store.invitations_for_organization(ctx.organization_id()).await?)
}

pub async fn cancel(state: &AppState, ctx: &OrgContext, invitation_id: Uuid) -> Result<Invitation, TenancyError> {
    ctx.require_rank(Role::Admin)?;
    let mut invitation = state
        .store
        .invitation(invitation_id)
        .await?
        .ok_or_else(|| TenancyError::not_found("invitation", invitation_id))?;
    ctx.scope().check_owner("invitation", invitation.id, invitation.organization_id)?;

    if invitation.status != InvitationStatus::Pending {
        return Err(TenancyError::conflict(format!(
            "invitation is already {}",
            invitation.status.as_str()
        )));
    }
    invitation.status = InvitationStatus::Cancelled;
    if !state.store.transition_invitation(&invitation, InvitationStatus::Pending).await? {
        return Err(TenancyError::conflict("invitation is no longer pending"));
    }

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Delete, "invitation", invitation.id)
            .in_organization(invitation.organization_id)
            .by(ctx.user.id),
    )
    .await;
    Ok(invitation)
}

/// Redeems an invitation for `user`. The invited organization becomes the
/// user's active one.
pub async fn accept(state: &AppState, user: &mut User, token: &str) -> Result<Membership, TenancyError> {
    let mut invitation = state
        .store
        .invitation_by_token(&auth::digest_token(token))
        .await?
        .ok_or_else(|| TenancyError::not_found("invitation", "token"))?;

    let now = Utc::now();
    if invitation.status != InvitationStatus::Pending {
        return Err(TenancyError::conflict(format!(
            "invitation is already {}",
            invitation.status.as_str()
        )));
    }
    if invitation.is_expired(now) {
        return Err(TenancyError::validation("invitation has expired"));
    }
    if invitation.email != user.email {
        tracing::warn!(
            "User {} tried to accept invitation {} addressed to another email",
            user.id,
            invitation.id
        );
        return Err(TenancyError::forbidden("invitation was issued to a different email"));
    }

    let organization = state
        .store
        .organization(invitation.organization_id)
        .await?
        .ok_or_else(|| TenancyError::not_found("organization", invitation.organization_id))?;
    if !organization.is_active {
        tracing::warn!(
            "User {} tried to join deactivated organization {}",
            user.id,
            organization.slug
        );
        return Err(TenancyError::OrganizationInactive(organization.slug));
    }

    // Only one accept can move the invitation out of Pending.
    invitation.status = InvitationStatus::Accepted;
    invitation.accepted_at = Some(now);
    if !state.store.transition_invitation(&invitation, InvitationStatus::Pending).await? {
        return Err(TenancyError::conflict("invitation has already been used"));
    }

    let membership = Membership::new(user.id, invitation.organization_id, invitation.role);
    state.store.upsert_membership(&membership).await?;

    if user.home_organization_id.is_none() {
        user.home_organization_id = Some(invitation.organization_id);
    }
    user.active_organization_id = Some(invitation.organization_id);
    user.updated_at = now;
    state.store.update_user(user).await?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Create, "membership", user.id)
            .in_organization(invitation.organization_id)
            .by(user.id)
            .with_changes(json!({ "invitation": invitation.id, "role": invitation.role })),
    )
    .await;

    tracing::info!("{} joined organization {}", user.email, invitation.organization_id);
    Ok(membership)
}
