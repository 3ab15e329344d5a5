// handlers/protected/records/product_lookup.rs - GET /api/invoicing/products/:id/lookup handler

use axum::{
    extract::{Path, State},
    Extension,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Product, ProductLookup};
use crate::middleware::{ApiResponse, ApiResult};
use crate::permissions::{Action, Module, Permission};
use crate::tenancy::OrgContext;

/// Price details for filling an invoice line, including the VAT-inclusive
/// unit price. Same organization rules as any product read.
pub async fn product_lookup_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductLookup> {
    ctx.require_permission(Permission::new(Module::Invoicing, Action::View))?;
    let product = ctx.repository::<Product>(state.store.as_ref()).get(id).await?;
    Ok(ApiResponse::success(ProductLookup::try_from(&product)?))
}
