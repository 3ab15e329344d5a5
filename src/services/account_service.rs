use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{self, AuthError, Claims};
use crate::database::models::user::normalize_email;
use crate::database::models::{AuditAction, AuditLogEntry, Organization, User};
use crate::services::{audit, organization_service};
use crate::tenancy::{resolve_session, SessionState, TenancyError};

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// When present, the new user founds this organization as its Owner.
    #[serde(default)]
    pub organization_name: Option<String>,
}

pub struct LoginOutcome {
    pub token: String,
    pub expires_in: u64,
    pub session: SessionState,
}

fn validate_credentials(state: &AppState, email: &str, password: &str) -> Result<(), TenancyError> {
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(TenancyError::validation(format!("invalid email '{}'", email)));
    }
    let min = state.config.security.min_password_length;
    if password.chars().count() < min {
        return Err(TenancyError::validation(format!(
            "password must be at least {} characters",
            min
        )));
    }
    Ok(())
}

async fn insert_new_user(state: &AppState, user: &User) -> Result<(), TenancyError> {
    if state.store.user_by_email(&user.email).await?.is_some() {
        return Err(TenancyError::conflict(format!("email '{}' is already registered", user.email)));
    }
    state.store.insert_user(user).await.map_err(|e| match e {
        crate::database::StoreError::UniqueViolation(_) => {
            TenancyError::conflict(format!("email '{}' is already registered", user.email))
        }
        other => other.into(),
    })
}

/// Signup. With an organization name the user becomes its Owner and it is
/// both their home and active organization.
pub async fn register(state: &AppState, registration: Registration) -> Result<(User, Option<Organization>), TenancyError> {
    let email = normalize_email(&registration.email);
    validate_credentials(state, &email, &registration.password)?;

    let mut user = User::new(&email, auth::hash_password(&registration.password)?);
    user.first_name = registration.first_name.trim().to_string();
    user.last_name = registration.last_name.trim().to_string();
    insert_new_user(state, &user).await?;
    tracing::info!("Registered user {}", user.email);

    let organization = match registration.organization_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            Some(organization_service::create_organization(state, &mut user, name).await?)
        }
        _ => None,
    };

    Ok((user, organization))
}

/// Verifies credentials, resolves the active organization and issues a token.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<LoginOutcome, TenancyError> {
    let email = normalize_email(email);
    let Some(user) = state.store.user_by_email(&email).await? else {
        tracing::warn!("Login failed for unknown email {}", email);
        return Err(AuthError::InvalidCredentials.into());
    };

    if !auth::verify_password(password, &user.password_hash)? {
        tracing::warn!("Login failed for {}: wrong password", email);
        return Err(AuthError::InvalidCredentials.into());
    }
    if !user.is_active {
        return Err(AuthError::InactiveUser.into());
    }

    let security = &state.config.security;
    let token = auth::generate_jwt(&Claims::new(user.id, &user.email, security.jwt_expiry_hours), security)?;
    let session = resolve_session(state, user).await?;

    if let SessionState::Active(ctx) = &session {
        audit::record(
            state,
            AuditLogEntry::new(AuditAction::Login, "user", ctx.user.id)
                .in_organization(ctx.organization.id)
                .by(ctx.user.id),
        )
        .await;
    }

    Ok(LoginOutcome {
        token,
        expires_in: security.jwt_expiry_hours * 3600,
        session,
    })
}

/// Creates a platform super administrator with no organization.
pub async fn create_superuser(state: &AppState, email: &str, password: &str) -> Result<User, TenancyError> {
    let email = normalize_email(email);
    validate_credentials(state, &email, password)?;

    let mut user = User::new(&email, auth::hash_password(password)?);
    user.is_super_admin = true;
    insert_new_user(state, &user).await?;
    tracing::info!("Created super administrator {}", user.email);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::MemoryStore;
    use crate::permissions::Role;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), Arc::new(AppConfig::development()))
    }

    fn registration(email: &str, org: Option<&str>) -> Registration {
        Registration {
            email: email.to_string(),
            password: "correct-horse".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            organization_name: org.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn signup_makes_owner_with_home_and_active_organization() {
        let state = state();
        let (user, org) = register(&state, registration("ada@acme.fr", Some("Acme"))).await.unwrap();
        let org = org.unwrap();

        assert_eq!(user.home_organization_id, Some(org.id));
        assert_eq!(user.active_organization_id, Some(org.id));
        let membership = state.store.membership(user.id, org.id).await.unwrap().unwrap();
        assert_eq!(membership.role, Role::Owner);
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let state = state();
        register(&state, registration("ada@acme.fr", None)).await.unwrap();
        let err = register(&state, registration("ADA@acme.fr", None)).await.unwrap_err();
        assert!(matches!(err, TenancyError::Conflict(_)));
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let state = state();
        let mut r = registration("ada@acme.fr", None);
        r.password = "short".into();
        assert!(matches!(register(&state, r).await, Err(TenancyError::Validation(_))));
    }

    #[tokio::test]
    async fn login_resolves_session() {
        let state = state();
        register(&state, registration("ada@acme.fr", Some("Acme"))).await.unwrap();
        register(&state, registration("bob@acme.fr", None)).await.unwrap();

        let outcome = authenticate(&state, "ada@acme.fr", "correct-horse").await.unwrap();
        assert!(matches!(outcome.session, SessionState::Active(_)));

        let outcome = authenticate(&state, "bob@acme.fr", "correct-horse").await.unwrap();
        assert!(matches!(outcome.session, SessionState::Authenticated { .. }));

        let err = authenticate(&state, "ada@acme.fr", "wrong-password").await.err().unwrap();
        assert!(matches!(err, TenancyError::Auth(AuthError::InvalidCredentials)));
    }
}
