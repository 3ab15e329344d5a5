//! PostgreSQL DDL, applied statement by statement by `DatabaseManager::migrate`.
//!
//! Every tenant table carries `organization_id` with `ON DELETE CASCADE`, an
//! index on it, and a partial unique index on `(organization_id, unique_key)`
//! so business keys only clash inside one organization.

use crate::database::models::EntityKind;

const REGISTRY: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS organizations (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        siret TEXT NOT NULL DEFAULT '',
        vat_number TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        postal_code TEXT NOT NULL DEFAULT '',
        city TEXT NOT NULL DEFAULT '',
        country TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        website TEXT NOT NULL DEFAULT '',
        iban TEXT NOT NULL DEFAULT '',
        bic TEXT NOT NULL DEFAULT '',
        primary_color TEXT NOT NULL DEFAULT '#3B82F6',
        timezone TEXT NOT NULL DEFAULT 'Europe/Paris',
        currency TEXT NOT NULL DEFAULT 'EUR',
        locale TEXT NOT NULL DEFAULT 'fr-FR',
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        trial_ends_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        job_title TEXT NOT NULL DEFAULT '',
        home_organization_id UUID REFERENCES organizations(id) ON DELETE SET NULL,
        active_organization_id UUID REFERENCES organizations(id) ON DELETE SET NULL,
        is_super_admin BOOLEAN NOT NULL DEFAULT FALSE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_2fa_enabled BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS memberships (
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'manager', 'member')),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (user_id, organization_id)
    )"#,
    "CREATE INDEX IF NOT EXISTS memberships_organization_idx ON memberships (organization_id)",
    r#"CREATE TABLE IF NOT EXISTS invitations (
        id UUID PRIMARY KEY,
        organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        email TEXT NOT NULL,
        role TEXT NOT NULL,
        token_hash TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL DEFAULT 'pending',
        invited_by UUID REFERENCES users(id) ON DELETE SET NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        accepted_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS invitations_organization_idx ON invitations (organization_id)",
    r#"CREATE TABLE IF NOT EXISTS audit_log (
        id UUID PRIMARY KEY,
        organization_id UUID REFERENCES organizations(id) ON DELETE CASCADE,
        user_id UUID REFERENCES users(id) ON DELETE SET NULL,
        action TEXT NOT NULL,
        entity TEXT NOT NULL,
        object_id TEXT NOT NULL,
        changes JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS audit_log_organization_idx ON audit_log (organization_id, created_at DESC)",
];

fn tenant_table(kind: EntityKind) -> [String; 3] {
    let table = kind.table();
    [
        format!(
            r#"CREATE TABLE IF NOT EXISTS {table} (
        id UUID PRIMARY KEY,
        organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        unique_key TEXT,
        data JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#
        ),
        format!("CREATE INDEX IF NOT EXISTS {table}_organization_idx ON {table} (organization_id)"),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {table}_org_key ON {table} (organization_id, unique_key) WHERE unique_key IS NOT NULL"
        ),
    ]
}

/// All statements, registry tables first so foreign keys resolve.
pub fn statements() -> Vec<String> {
    let mut all: Vec<String> = REGISTRY.iter().map(|s| s.to_string()).collect();
    for kind in EntityKind::ALL {
        all.extend(tenant_table(kind));
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tenant_table_cascades_and_is_indexed() {
        let sql = statements();
        for kind in EntityKind::ALL {
            let create = sql
                .iter()
                .find(|s| s.starts_with(&format!("CREATE TABLE IF NOT EXISTS {} ", kind.table())))
                .unwrap();
            assert!(create.contains("REFERENCES organizations(id) ON DELETE CASCADE"));
            assert!(sql.iter().any(|s| s.contains(&format!("{}_org_key", kind.table()))));
        }
    }

    #[test]
    fn organizations_created_first() {
        assert!(statements()[0].contains("CREATE TABLE IF NOT EXISTS organizations"));
    }
}
