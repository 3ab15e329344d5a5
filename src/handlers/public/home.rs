// handlers/public/home.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ORGANIZATION_SELECTION_PATH;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "BizHub API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-organization business management API",
            "endpoints": {
                "home": "/, /health (public)",
                "auth": "/auth/register, /auth/login (public)",
                "session": "/api/auth/whoami (protected)",
                "organizations": format!("{} (protected - list, create, switch)", ORGANIZATION_SELECTION_PATH),
                "organization": "/api/organization[/members|/invitations|/audit] (active organization)",
                "crm": "/api/crm/companies, /api/crm/contacts (active organization)",
                "invoicing": "/api/invoicing/products, /api/invoicing/invoices (active organization)",
                "hr": "/api/hr/employees (active organization)",
                "root": "/api/root/organizations (super administrators)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
