use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access-control core.
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod password;
pub mod reports;
pub mod scope;
pub mod token;

// CRUD glue over the core.
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::Identity;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use password::{BcryptHasher, PasswordHasher};
pub use repository::{PostgresRepository, RepositoryState};

/// AppState
///
/// The single, thread-safe, immutable container holding all services the
/// handlers need, shared across every incoming request. The only read-mostly
/// shared pieces are the configuration (incl. the signing secret) and the
/// store handle; everything per-request is derived fresh.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: the black-box persistence collaborator.
    pub repo: RepositoryState,
    /// Credential hasher collaborator (opaque one-way hash + compare).
    pub hasher: std::sync::Arc<dyn PasswordHasher>,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// FromRef implementations let extractors pull individual components out of the
// shared state; the Identity extractor only ever needs AppConfig.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the protected routers. Extracting `Identity`
/// runs the full Authentication Gate; any failure rejects the request with an
/// opaque 401 before the handler executes.
async fn auth_middleware(_identity: Identity, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: the gate runs before any handler.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes, nested under '/admin'. Authentication is layered here
        // too; the ADMIN role requirement is enforced per-operation inside the
        // handlers via RouteAccess.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state);

    // Observability and correlation layers, applied outermost.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes TraceLayer's span creation so every log line for a single
/// request is correlated by the generated x-request-id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
