// handlers/protected/records/mod.rs - Tenant-scoped business records
//
// One generic handler set serves every `TenantScoped` entity. Handlers
// never see an organization id from the client: the repository is built from
// the request's `OrgContext`.

pub mod crud;
pub mod product_lookup;

use axum::{routing::get, Router};

use crate::app::AppState;
use crate::tenancy::TenantScoped;

pub use product_lookup::product_lookup_get;

/// `GET|POST {base}` and `GET|PATCH|DELETE {base}/:id` for `T`.
pub fn entity_routes<T: TenantScoped>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(crud::list::<T>).post(crud::create::<T>))
        .route(
            &format!("{}/:id", base),
            get(crud::show::<T>).patch(crud::update::<T>).delete(crud::delete::<T>),
        )
}
