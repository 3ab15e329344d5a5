use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::models::{Company, Contact, Employee, Invoice, Product};
use crate::database::store::Store;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{
    jwt_auth_middleware, organization_required_middleware, resolve_session_middleware, super_admin_middleware,
};

/// Shared request state. Configuration travels with the state rather than
/// being read from the global singleton inside handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.api.max_request_size_bytes;

    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(elevated_routes(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    router.with_state(state)
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    if config.security.cors_origins.iter().any(|o| o == "*") {
        return Some(base.allow_origin(Any));
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    Some(base.allow_origin(origins))
}

fn public_routes() -> Router<AppState> {
    use public::{auth, home};

    Router::new()
        .route("/", get(home::root))
        .route("/health", get(home::health))
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

/// JWT → session resolution → (organization gate) → handler.
/// Layers added last run first.
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, invitations, organizations};

    let session_routes = Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/organizations", get(organizations::list_get).post(organizations::create_post))
        .route("/api/organizations/switch", post(organizations::switch_post))
        .route("/api/invitations/accept", post(invitations::accept_post));

    session_routes
        .merge(organization_routes())
        .route_layer(from_fn_with_state(state.clone(), resolve_session_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn organization_routes() -> Router<AppState> {
    use protected::{organization, records};

    Router::new()
        .route("/api/organization", get(organization::show_get).patch(organization::update_patch))
        .route("/api/organization/deactivate", post(organization::deactivate_post))
        .route("/api/organization/audit", get(organization::audit_get))
        .route("/api/organization/members", get(organization::members_get))
        .route(
            "/api/organization/members/:user_id",
            put(organization::member_put).delete(organization::member_delete),
        )
        .route(
            "/api/organization/invitations",
            get(organization::invitations_get).post(organization::invitations_post),
        )
        .route(
            "/api/organization/invitations/:id",
            axum::routing::delete(organization::invitation_delete),
        )
        .merge(records::entity_routes::<Company>("/api/crm/companies"))
        .merge(records::entity_routes::<Contact>("/api/crm/contacts"))
        .merge(records::entity_routes::<Product>("/api/invoicing/products"))
        .merge(records::entity_routes::<Invoice>("/api/invoicing/invoices"))
        .merge(records::entity_routes::<Employee>("/api/hr/employees"))
        .route("/api/invoicing/products/:id/lookup", get(records::product_lookup_get))
        .route_layer(from_fn(organization_required_middleware))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    use elevated::root;

    Router::new()
        .route("/api/root/organizations", get(root::organization_list))
        .route("/api/root/organizations/:id", get(root::organization_show))
        .route("/api/root/organizations/:id/activate", post(root::organization_activate))
        .route("/api/root/organizations/:id/deactivate", post(root::organization_deactivate))
        .route("/api/root/organizations/:id/admin", post(root::organization_admin))
        .route_layer(from_fn(super_admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), resolve_session_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
