use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub job_title: String,
    /// Organization the user signed up with; fallback when no selection is stored.
    pub home_organization_id: Option<Uuid>,
    /// Last explicitly selected organization.
    pub active_organization_id: Option<Uuid>,
    pub is_super_admin: bool,
    pub is_active: bool,
    pub is_2fa_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            job_title: String::new(),
            home_organization_id: None,
            active_organization_id: None,
            is_super_admin: false,
            is_active: true,
            is_2fa_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    pub fn initials(&self) -> String {
        match (self.first_name.chars().next(), self.last_name.chars().next()) {
            (Some(f), Some(l)) => format!("{}{}", f, l).to_uppercase(),
            _ => self.email.chars().take(2).collect::<String>().to_uppercase(),
        }
    }
}

/// Emails are the login key: compared trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Public projection of a user, safe to return from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub initials: String,
    pub job_title: String,
    pub is_super_admin: bool,
    pub home_organization_id: Option<Uuid>,
    pub active_organization_id: Option<Uuid>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name(),
            initials: user.initials(),
            job_title: user.job_title.clone(),
            is_super_admin: user.is_super_admin,
            home_organization_id: user.home_organization_id,
            active_organization_id: user.active_organization_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let user = User::new("  Ada@Example.COM ", String::new());
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn names_fall_back_to_email() {
        let mut user = User::new("grace@example.com", String::new());
        assert_eq!(user.full_name(), "grace@example.com");
        assert_eq!(user.initials(), "GR");

        user.first_name = "Grace".into();
        user.last_name = "hopper".into();
        assert_eq!(user.full_name(), "Grace hopper");
        assert_eq!(user.initials(), "GH");
    }

    #[test]
    fn password_hash_never_serialized() {
        let user = User::new("a@b.co", "secret-hash".into());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
