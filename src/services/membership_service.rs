use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{AuditAction, AuditLogEntry, MemberView, Membership};
use crate::permissions::Role;
use crate::services::audit;
use crate::tenancy::{OrgContext, TenancyError};

pub async fn list_members(state: &AppState, ctx: &OrgContext) -> Result<Vec<MemberView>, TenancyError> {
    ctx.require_rank(Role::Member)?;

    let mut members = Vec::new();
    for membership in state.store.memberships_for_organization(ctx.organization_id()).await? {
        let Some(user) = state.store.user(membership.user_id).await? else {
            tracing::warn!("Membership references missing user {}", membership.user_id);
            continue;
        };
        members.push(MemberView {
            user_id: user.id,
            full_name: user.full_name(),
            email: user.email,
            role: membership.role,
            is_active: membership.is_active && user.is_active,
            joined_at: membership.created_at,
        });
    }
    members.sort_by(|a, b| b.role.cmp(&a.role).then_with(|| a.email.cmp(&b.email)));
    Ok(members)
}

async fn target_membership(state: &AppState, ctx: &OrgContext, user_id: Uuid) -> Result<Membership, TenancyError> {
    state
        .store
        .membership(user_id, ctx.organization_id())
        .await?
        .ok_or_else(|| TenancyError::not_found("membership", user_id))
}

/// Refuses to leave the organization without an active Owner.
async fn ensure_other_owner(state: &AppState, ctx: &OrgContext, leaving: Uuid) -> Result<(), TenancyError> {
    let remaining = state
        .store
        .memberships_for_organization(ctx.organization_id())
        .await?
        .into_iter()
        .filter(|m| m.user_id != leaving && m.role == Role::Owner && m.is_active)
        .count();
    if remaining == 0 {
        return Err(TenancyError::conflict("an organization must keep at least one owner"));
    }
    Ok(())
}

/// Assigns `role` to an existing member, replacing the previous one.
pub async fn set_role(state: &AppState, ctx: &OrgContext, user_id: Uuid, role: Role) -> Result<Membership, TenancyError> {
    ctx.require_rank(Role::Admin)?;
    let mut membership = target_membership(state, ctx, user_id).await?;
    if membership.role == role {
        return Ok(membership);
    }
    if role == Role::Owner || membership.role == Role::Owner {
        ctx.require_rank(Role::Owner)?;
    }
    if membership.role == Role::Owner {
        ensure_other_owner(state, ctx, user_id).await?;
    }

    let previous = membership.role;
    membership.role = role;
    state.store.upsert_membership(&membership).await?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::RoleChange, "membership", user_id)
            .in_organization(ctx.organization_id())
            .by(ctx.user.id)
            .with_changes(json!({ "from": previous, "to": role })),
    )
    .await;
    Ok(membership)
}

pub async fn remove_member(state: &AppState, ctx: &OrgContext, user_id: Uuid) -> Result<(), TenancyError> {
    ctx.require_rank(Role::Admin)?;
    let membership = target_membership(state, ctx, user_id).await?;
    if membership.role == Role::Owner {
        ctx.require_rank(Role::Owner)?;
        ensure_other_owner(state, ctx, user_id).await?;
    }

    state.store.delete_membership(user_id, ctx.organization_id()).await?;

    if let Some(mut user) = state.store.user(user_id).await? {
        if user.active_organization_id == Some(ctx.organization_id()) {
            user.active_organization_id = None;
            user.updated_at = Utc::now();
            state.store.update_user(&user).await?;
        }
    }

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Delete, "membership", user_id)
            .in_organization(ctx.organization_id())
            .by(ctx.user.id)
            .with_changes(json!({ "role": membership.role })),
    )
    .await;
    Ok(())
}

#[derive(Debug, Default, Serialize)]
pub struct MigrationReport {
    pub examined: usize,
    pub created: usize,
    pub skipped: usize,
    pub dry_run: bool,
}

/// Backfill for accounts that predate memberships: a user with a home
/// organization but no membership there becomes a Member of it, and it
/// becomes their active organization if none is set.
pub async fn migrate_memberships(state: &AppState, dry_run: bool) -> Result<MigrationReport, TenancyError> {
    let mut report = MigrationReport { dry_run, ..Default::default() };

    for mut user in state.store.list_users().await? {
        let Some(home) = user.home_organization_id else {
            continue;
        };
        report.examined += 1;

        if state.store.membership(user.id, home).await?.is_some() {
            report.skipped += 1;
            continue;
        }
        if state.store.organization(home).await?.is_none() {
            tracing::warn!("User {} has a dangling home organization {}", user.email, home);
            report.skipped += 1;
            continue;
        }

        report.created += 1;
        if dry_run {
            tracing::info!("Would add {} as member of {}", user.email, home);
            continue;
        }

        state.store.upsert_membership(&Membership::new(user.id, home, Role::Member)).await?;
        if user.active_organization_id.is_none() {
            user.active_organization_id = Some(home);
            user.updated_at = Utc::now();
            state.store.update_user(&user).await?;
        }
        tracing::info!("Added {} as member of {}", user.email, home);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, DeactivatedPolicy};
    use crate::database::models::{Organization, User};
    use crate::database::MemoryStore;
    use crate::services::organization_service;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), Arc::new(AppConfig::development()))
    }

    async fn user(state: &AppState, email: &str) -> User {
        let user = User::new(email, String::new());
        state.store.insert_user(&user).await.unwrap();
        user
    }

    fn ctx(user: &User, org: &Organization, role: Role) -> OrgContext {
        OrgContext {
            user: user.clone(),
            organization: org.clone(),
            role: Some(role),
            policy: DeactivatedPolicy::ReadOnly,
        }
    }

    async fn setup() -> (AppState, User, User, Organization) {
        let state = state();
        let mut owner = user(&state, "owner@acme.fr").await;
        let org = organization_service::create_organization(&state, &mut owner, "Acme").await.unwrap();
        let mut member = user(&state, "member@acme.fr").await;
        state
            .store
            .upsert_membership(&Membership::new(member.id, org.id, Role::Member))
            .await
            .unwrap();
        member.active_organization_id = Some(org.id);
        state.store.update_user(&member).await.unwrap();
        (state, owner, member, org)
    }

    #[tokio::test]
    async fn lists_members_owner_first() {
        let (state, owner, _, org) = setup().await;
        let members = list_members(&state, &ctx(&owner, &org, Role::Owner)).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].role, Role::Owner);
    }

    #[tokio::test]
    async fn admin_cannot_grant_owner() {
        let (state, owner, member, org) = setup().await;
        let err = set_role(&state, &ctx(&owner, &org, Role::Admin), member.id, Role::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, TenancyError::InsufficientRank { .. }));

        let updated = set_role(&state, &ctx(&owner, &org, Role::Admin), member.id, Role::Manager)
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Manager);
    }

    #[tokio::test]
    async fn last_owner_cannot_step_down() {
        let (state, owner, _, org) = setup().await;
        let err = set_role(&state, &ctx(&owner, &org, Role::Owner), owner.id, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, TenancyError::Conflict(_)));
        assert!(remove_member(&state, &ctx(&owner, &org, Role::Owner), owner.id).await.is_err());
    }

    #[tokio::test]
    async fn removal_clears_active_organization() {
        let (state, owner, member, org) = setup().await;
        remove_member(&state, &ctx(&owner, &org, Role::Owner), member.id).await.unwrap();
        assert!(state.store.membership(member.id, org.id).await.unwrap().is_none());
        let member = state.store.user(member.id).await.unwrap().unwrap();
        assert_eq!(member.active_organization_id, None);
    }

    #[tokio::test]
    async fn migration_backfills_home_memberships() {
        let state = state();
        let mut founder = user(&state, "f@acme.fr").await;
        let org = organization_service::create_organization(&state, &mut founder, "Acme").await.unwrap();

        let mut legacy = User::new("legacy@acme.fr", String::new());
        legacy.home_organization_id = Some(org.id);
        state.store.insert_user(&legacy).await.unwrap();

        let report = migrate_memberships(&state, true).await.unwrap();
        assert_eq!(report.created, 1);
        assert!(state.store.membership(legacy.id, org.id).await.unwrap().is_none());

        let report = migrate_memberships(&state, false).await.unwrap();
        assert_eq!((report.examined, report.created, report.skipped), (2, 1, 1));
        let membership = state.store.membership(legacy.id, org.id).await.unwrap().unwrap();
        assert_eq!(membership.role, Role::Member);
        let legacy = state.store.user(legacy.id).await.unwrap().unwrap();
        assert_eq!(legacy.active_organization_id, Some(org.id));
    }
}
