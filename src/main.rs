use std::sync::Arc;
use taskboard::{
    AppState, BcryptHasher, PostgresRepository, RepositoryState, create_router,
    config::{AppConfig, Env},
};

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The asynchronous entry point: configuration, logging, database, HTTP server.
#[tokio::main]
async fn main() {
    // Configuration & environment loading (fail-fast: production refuses to
    // start without an explicit signing secret).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskboard=debug,tower_http=info,axum=trace".into());

    // Structured logging format is selected by environment: pretty output for
    // local debugging, JSON for centralized aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let app_state = AppState {
        repo,
        hasher: Arc::new(BcryptHasher::new()),
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("FATAL: failed to bind 0.0.0.0:3000");

    tracing::info!("Listening on 0.0.0.0:3000");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server terminated unexpectedly");
}
