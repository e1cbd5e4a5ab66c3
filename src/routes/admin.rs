use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Routes exclusively accessible to ADMIN identities, nested under `/admin`.
/// The surrounding router layer authenticates the request; each handler then
/// enforces the ADMIN_ONLY RouteAccess record before touching the store.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Full user directory (profiles only, never password hashes). Used to
        // pick assignees when managing projects and tasks.
        .route("/users", get(handlers::list_users))
}
