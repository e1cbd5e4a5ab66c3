use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// The only endpoints reachable without a bearer token: the liveness probe and
/// the credential exchange. Everything else in the system sits behind the
/// Authentication Gate.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates a user record; the password goes straight to the hashing
        // collaborator and is never persisted or logged in the clear.
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/login
        // Verifies the password and issues a signed bearer token.
        .route("/auth/login", post(handlers::login))
}
