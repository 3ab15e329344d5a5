use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub tenancy: TenancyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which `Store` implementation backs the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// What members of a deactivated organization may still do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivatedPolicy {
    /// Reads succeed, every write is rejected.
    ReadOnly,
    /// Every request scoped to the organization is rejected.
    Blocked,
}

impl FromStr for DeactivatedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read_only" | "readonly" | "read-only" => Ok(DeactivatedPolicy::ReadOnly),
            "blocked" | "block" => Ok(DeactivatedPolicy::Blocked),
            other => Err(format!("unknown deactivated policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub auto_migrate: bool,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_audit_logging: bool,
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    pub deactivated_policy: DeactivatedPolicy,
    pub invitation_ttl_days: i64,
    pub default_country: String,
    pub default_currency: String,
    pub default_timezone: String,
    pub default_locale: String,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            deactivated_policy: DeactivatedPolicy::ReadOnly,
            invitation_ttl_days: 7,
            default_country: "France".to_string(),
            default_currency: "EUR".to_string(),
            default_timezone: "Europe/Paris".to_string(),
            default_locale: "fr-FR".to_string(),
        }
    }
}

pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;
pub const MAX_INVITATION_TTL_DAYS: i64 = 365;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("BIZHUB_STORE") {
            self.database.backend = v.parse().unwrap_or(self.database.backend);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = v.parse().unwrap_or(self.database.auto_migrate);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("BIZHUB_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        // Tenancy overrides
        if let Ok(v) = env::var("TENANCY_DEACTIVATED_POLICY") {
            match v.parse() {
                Ok(policy) => self.tenancy.deactivated_policy = policy,
                Err(e) => tracing::warn!("Ignoring TENANCY_DEACTIVATED_POLICY: {}", e),
            }
        }
        if let Ok(v) = env::var("TENANCY_INVITATION_TTL_DAYS") {
            self.tenancy.invitation_ttl_days = v.parse().unwrap_or(self.tenancy.invitation_ttl_days);
        }

        self.clamped()
    }

    /// Keeps durations where token and invitation expiry arithmetic is safe.
    fn clamped(mut self) -> Self {
        let hours = self.security.jwt_expiry_hours.clamp(1, MAX_JWT_EXPIRY_HOURS);
        if hours != self.security.jwt_expiry_hours {
            tracing::warn!("SECURITY_JWT_EXPIRY_HOURS clamped to {}", hours);
            self.security.jwt_expiry_hours = hours;
        }
        let days = self.tenancy.invitation_ttl_days.clamp(1, MAX_INVITATION_TTL_DAYS);
        if days != self.tenancy.invitation_ttl_days {
            tracing::warn!("TENANCY_INVITATION_TTL_DAYS clamped to {}", days);
            self.tenancy.invitation_ttl_days = days;
        }
        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 10,
                connection_timeout: 30,
                auto_migrate: true,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "bizhub-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_audit_logging: true,
                min_password_length: 8,
            },
            tenancy: TenancyConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
                auto_migrate: true,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_audit_logging: true,
                min_password_length: 10,
            },
            tenancy: TenancyConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
                auto_migrate: false,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_audit_logging: true,
                min_password_length: 12,
            },
            tenancy: TenancyConfig {
                deactivated_policy: DeactivatedPolicy::Blocked,
                ..TenancyConfig::default()
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_permissive() {
        let config = AppConfig::development();
        assert_eq!(config.tenancy.deactivated_policy, DeactivatedPolicy::ReadOnly);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(config.database.auto_migrate);
    }

    #[test]
    fn production_blocks_deactivated_organizations() {
        let config = AppConfig::production();
        assert_eq!(config.tenancy.deactivated_policy, DeactivatedPolicy::Blocked);
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.auto_migrate);
    }

    #[test]
    fn out_of_range_durations_are_clamped() {
        let mut config = AppConfig::development();
        config.security.jwt_expiry_hours = u64::MAX;
        config.tenancy.invitation_ttl_days = i64::MAX;
        let config = config.clamped();
        assert_eq!(config.security.jwt_expiry_hours, MAX_JWT_EXPIRY_HOURS);
        assert_eq!(config.tenancy.invitation_ttl_days, MAX_INVITATION_TTL_DAYS);

        let mut config = AppConfig::development();
        config.security.jwt_expiry_hours = 0;
        config.tenancy.invitation_ttl_days = -5;
        let config = config.clamped();
        assert_eq!(config.security.jwt_expiry_hours, 1);
        assert_eq!(config.tenancy.invitation_ttl_days, 1);
    }

    #[test]
    fn parses_policy_and_backend_names() {
        assert_eq!("read-only".parse::<DeactivatedPolicy>(), Ok(DeactivatedPolicy::ReadOnly));
        assert_eq!("BLOCKED".parse::<DeactivatedPolicy>(), Ok(DeactivatedPolicy::Blocked));
        assert!("sometimes".parse::<DeactivatedPolicy>().is_err());
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("pg".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
    }
}
