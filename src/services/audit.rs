use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::AuditLogEntry;
use crate::tenancy::error::TenancyError;

/// Appends to the audit log when enabled. A failed append is logged and
/// never fails the operation being audited.
pub async fn record(state: &AppState, entry: AuditLogEntry) {
    if !state.config.security.enable_audit_logging {
        return;
    }
    if let Err(e) = state.store.append_audit(&entry).await {
        tracing::error!(
            "Failed to append audit entry {} {} {}: {}",
            entry.action.as_str(),
            entry.entity,
            entry.object_id,
            e
        );
    }
}

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

/// Newest entries of one organization.
pub async fn for_organization(
    state: &AppState,
    organization_id: Uuid,
    limit: Option<usize>,
) -> Result<Vec<AuditLogEntry>, TenancyError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Ok(state.store.audit_for_organization(organization_id, limit).await?)
}
