pub mod auth;
pub mod organization;
pub mod response;
pub mod session;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use organization::{organization_required_middleware, super_admin_middleware};
pub use response::{ApiResponse, ApiResult};
pub use session::resolve_session_middleware;
