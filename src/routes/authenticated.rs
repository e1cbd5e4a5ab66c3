use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any identity that passed the Authentication Gate. Every handler
/// receives a verified `Identity`; visibility is enforced through the scoping
/// policy and the coarser mutations additionally declare an ADMIN_ONLY
/// RouteAccess record.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The authenticated user's own profile.
        .route("/me", get(handlers::get_me))
        // --- Projects ---
        // GET lists/reads are scope-filtered (ADMIN all; USER creator-or-member).
        // POST is ADMIN-only: membership grants visibility, not mutation rights.
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        // POST/DELETE /projects/{id}/users/{user_id}
        // ADMIN-only membership management; referenced users must exist.
        .route(
            "/projects/{id}/users/{user_id}",
            post(handlers::assign_project_user).delete(handlers::remove_project_user),
        )
        // --- Tasks ---
        // GET /tasks?project_id=...&status=... is scope-filtered (ADMIN all;
        // USER assignee only). POST is ADMIN-only.
        .route(
            "/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        // PUT is allowed for ADMIN or the current assignee; DELETE is ADMIN-only.
        .route(
            "/tasks/{id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        // GET /tasks/{id}/history
        // The append-only audit trail, most-recent-first, readable by whoever
        // can read the task.
        .route("/tasks/{id}/history", get(handlers::get_task_history))
        // GET /dashboard/stats
        // Aggregates computed strictly over the caller's visible records.
        .route("/dashboard/stats", get(handlers::dashboard_stats))
}
