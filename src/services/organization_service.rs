use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{
    AuditAction, AuditLogEntry, Membership, Organization, OrganizationSettings, User,
};
use crate::permissions::Role;
use crate::services::audit;
use crate::tenancy::{OrgContext, TenancyError};

/// URL-safe slug: lower-case ASCII, dashes between words.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        let c = match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' | 'õ' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        };
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "organization".to_string()
    } else {
        slug
    }
}

/// First free slug among `base`, `base-2`, `base-3`, ...
async fn unique_slug(state: &AppState, name: &str) -> Result<String, TenancyError> {
    let base = slugify(name);
    let mut candidate = base.clone();
    let mut suffix = 2;
    while state.store.organization_by_slug(&candidate).await?.is_some() {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    Ok(candidate)
}

/// Onboarding: creates an organization owned by `user` and makes it their
/// active organization (and home, if they had none).
pub async fn create_organization(state: &AppState, user: &mut User, name: &str) -> Result<Organization, TenancyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TenancyError::validation("organization name is required"));
    }

    let organization = Organization::new(name, &unique_slug(state, name).await?, &state.config.tenancy);
    state.store.insert_organization(&organization).await?;
    state
        .store
        .upsert_membership(&Membership::new(user.id, organization.id, Role::Owner))
        .await?;

    if user.home_organization_id.is_none() {
        user.home_organization_id = Some(organization.id);
    }
    user.active_organization_id = Some(organization.id);
    user.updated_at = Utc::now();
    state.store.update_user(user).await?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Create, "organization", organization.id)
            .in_organization(organization.id)
            .by(user.id)
            .with_changes(json!({ "name": organization.name, "slug": organization.slug })),
    )
    .await;

    tracing::info!("Organization {} created by {}", organization.slug, user.email);
    Ok(organization)
}

pub async fn update_settings(
    state: &AppState,
    ctx: &OrgContext,
    settings: OrganizationSettings,
) -> Result<Organization, TenancyError> {
    ctx.require_rank(Role::Admin)?;
    settings.validate()?;

    let mut organization = state
        .store
        .organization(ctx.organization_id())
        .await?
        .ok_or_else(|| TenancyError::not_found("organization", ctx.organization_id()))?;

    let changes = serde_json::to_value(&settings).map_err(crate::database::StoreError::from)?;
    settings.apply(&mut organization);
    state.store.update_organization(&organization).await?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::Update, "organization", organization.id)
            .in_organization(organization.id)
            .by(ctx.user.id)
            .with_changes(strip_nulls(changes)),
    )
    .await;

    Ok(organization)
}

fn strip_nulls(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        other => other,
    }
}

/// Owner-initiated deactivation of the caller's organization.
pub async fn deactivate_own(state: &AppState, ctx: &OrgContext) -> Result<Organization, TenancyError> {
    ctx.require_rank(Role::Owner)?;
    set_active(state, Some(&ctx.user), ctx.organization_id(), false).await
}

/// Flips the active flag. Rows are never deleted. `actor` is `None` for
/// operator commands.
pub async fn set_active(
    state: &AppState,
    actor: Option<&User>,
    organization_id: Uuid,
    active: bool,
) -> Result<Organization, TenancyError> {
    let mut organization = state
        .store
        .organization(organization_id)
        .await?
        .ok_or_else(|| TenancyError::not_found("organization", organization_id))?;

    if organization.is_active == active {
        return Ok(organization);
    }
    organization.is_active = active;
    organization.updated_at = Utc::now();
    state.store.update_organization(&organization).await?;

    let action = if active { AuditAction::Activate } else { AuditAction::Deactivate };
    let mut entry = AuditLogEntry::new(action, "organization", organization.id).in_organization(organization.id);
    if let Some(actor) = actor {
        entry = entry.by(actor.id);
    }
    audit::record(state, entry).await;

    tracing::info!(
        "Organization {}: {} by {}",
        organization.slug,
        action.as_str(),
        actor.map(|a| a.email.as_str()).unwrap_or("operator")
    );
    Ok(organization)
}

/// Super-admin handover: every current Owner/Admin other than the target is
/// demoted to Member, then the target is granted Admin.
pub async fn assign_admin(
    state: &AppState,
    actor: &User,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<Membership, TenancyError> {
    if !actor.is_super_admin {
        return Err(TenancyError::SuperAdminRequired);
    }
    let organization = state
        .store
        .organization(organization_id)
        .await?
        .ok_or_else(|| TenancyError::not_found("organization", organization_id))?;
    let target = state
        .store
        .user(user_id)
        .await?
        .ok_or_else(|| TenancyError::not_found("user", user_id))?;

    let mut demoted = Vec::new();
    for mut membership in state.store.memberships_for_organization(organization.id).await? {
        if membership.user_id != target.id && membership.role >= Role::Admin {
            membership.role = Role::Member;
            state.store.upsert_membership(&membership).await?;
            demoted.push(membership.user_id);
        }
    }

    let membership = Membership::new(target.id, organization.id, Role::Admin);
    state.store.upsert_membership(&membership).await?;

    audit::record(
        state,
        AuditLogEntry::new(AuditAction::RoleChange, "membership", target.id)
            .in_organization(organization.id)
            .by(actor.id)
            .with_changes(json!({ "role": Role::Admin, "demoted": demoted })),
    )
    .await;

    tracing::info!(
        "Assigned {} as admin of {} ({} demoted)",
        target.email,
        organization.slug,
        demoted.len()
    );
    Ok(membership)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, DeactivatedPolicy};
    use crate::database::MemoryStore;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), Arc::new(AppConfig::development()))
    }

    async fn owner(state: &AppState, email: &str, org_name: &str) -> (User, Organization) {
        let mut user = User::new(email, String::new());
        state.store.insert_user(&user).await.unwrap();
        let org = create_organization(state, &mut user, org_name).await.unwrap();
        (user, org)
    }

    fn ctx(user: &User, org: &Organization, role: Role) -> OrgContext {
        OrgContext {
            user: user.clone(),
            organization: org.clone(),
            role: Some(role),
            policy: DeactivatedPolicy::ReadOnly,
        }
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Café Dupont & Fils"), "cafe-dupont-fils");
        assert_eq!(slugify("  --  "), "organization");
        assert_eq!(slugify("ACME 2024"), "acme-2024");
    }

    #[tokio::test]
    async fn duplicate_names_get_numbered_slugs() {
        let state = state();
        let (_, first) = owner(&state, "a@x.fr", "Acme").await;
        let (_, second) = owner(&state, "b@x.fr", "Acme").await;
        let (_, third) = owner(&state, "c@x.fr", "ACME").await;
        assert_eq!(first.slug, "acme");
        assert_eq!(second.slug, "acme-2");
        assert_eq!(third.slug, "acme-3");
    }

    #[tokio::test]
    async fn settings_require_admin() {
        let state = state();
        let (user, org) = owner(&state, "a@x.fr", "Acme").await;
        let settings = OrganizationSettings { city: Some("Lille".into()), ..Default::default() };

        let err = update_settings(&state, &ctx(&user, &org, Role::Manager), settings.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, TenancyError::InsufficientRank { .. }));

        let updated = update_settings(&state, &ctx(&user, &org, Role::Admin), settings).await.unwrap();
        assert_eq!(updated.city, "Lille");
    }

    #[tokio::test]
    async fn only_owner_deactivates() {
        let state = state();
        let (user, org) = owner(&state, "a@x.fr", "Acme").await;
        assert!(deactivate_own(&state, &ctx(&user, &org, Role::Admin)).await.is_err());
        let org = deactivate_own(&state, &ctx(&user, &org, Role::Owner)).await.unwrap();
        assert!(!org.is_active);
    }

    #[tokio::test]
    async fn assign_admin_demotes_previous_leaders() {
        let state = state();
        let (founder, org) = owner(&state, "a@x.fr", "Acme").await;
        let newcomer = User::new("n@x.fr", String::new());
        state.store.insert_user(&newcomer).await.unwrap();

        let mut root = User::new("root@x.fr", String::new());
        root.is_super_admin = true;

        assign_admin(&state, &root, org.id, newcomer.id).await.unwrap();

        let founder_membership = state.store.membership(founder.id, org.id).await.unwrap().unwrap();
        assert_eq!(founder_membership.role, Role::Member);
        let new_membership = state.store.membership(newcomer.id, org.id).await.unwrap().unwrap();
        assert_eq!(new_membership.role, Role::Admin);

        assert!(matches!(
            assign_admin(&state, &founder, org.id, founder.id).await,
            Err(TenancyError::SuperAdminRequired)
        ));
    }
}
