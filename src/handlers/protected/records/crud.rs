use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{AuditAction, AuditLogEntry};
use crate::middleware::{ApiResponse, ApiResult};
use crate::permissions::{Action, Permission};
use crate::services::audit;
use crate::tenancy::{OrgContext, TenantScoped};

fn require<T: TenantScoped>(ctx: &OrgContext, action: Action) -> Result<(), crate::error::ApiError> {
    ctx.require_permission(Permission::new(T::MODULE, action))?;
    Ok(())
}

async fn record_change<T: TenantScoped>(state: &AppState, ctx: &OrgContext, action: AuditAction, entity: &T) {
    let changes = serde_json::to_value(entity).unwrap_or_default();
    audit::record(
        state,
        AuditLogEntry::new(action, T::KIND.as_str(), entity.id())
            .in_organization(entity.organization_id())
            .by(ctx.user.id)
            .with_changes(changes),
    )
    .await;
}

/// GET /api/{module}/{entity}
pub async fn list<T: TenantScoped>(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> ApiResult<Vec<T>> {
    require::<T>(&ctx, Action::View)?;
    let rows = ctx.repository::<T>(state.store.as_ref()).list().await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/{module}/{entity}
pub async fn create<T: TenantScoped>(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(input): Json<T::Input>,
) -> ApiResult<T> {
    require::<T>(&ctx, Action::Create)?;
    let entity = ctx.repository::<T>(state.store.as_ref()).create(input).await?;
    record_change(&state, &ctx, AuditAction::Create, &entity).await;
    Ok(ApiResponse::created(entity))
}

/// GET /api/{module}/{entity}/:id
pub async fn show<T: TenantScoped>(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<T> {
    require::<T>(&ctx, Action::View)?;
    let entity = ctx.repository::<T>(state.store.as_ref()).get(id).await?;
    Ok(ApiResponse::success(entity))
}

/// PATCH /api/{module}/{entity}/:id
pub async fn update<T: TenantScoped>(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
    Json(patch): Json<T::Patch>,
) -> ApiResult<T> {
    require::<T>(&ctx, Action::Edit)?;
    let entity = ctx.repository::<T>(state.store.as_ref()).update(id, patch).await?;
    record_change(&state, &ctx, AuditAction::Update, &entity).await;
    Ok(ApiResponse::success(entity))
}

/// DELETE /api/{module}/{entity}/:id
pub async fn delete<T: TenantScoped>(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<T> {
    require::<T>(&ctx, Action::Delete)?;
    let entity = ctx.repository::<T>(state.store.as_ref()).delete(id).await?;
    record_change(&state, &ctx, AuditAction::Delete, &entity).await;
    Ok(ApiResponse::success(entity))
}
