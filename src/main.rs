use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::env;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unimarket_backend::{AppState, handlers, services::documents::DocumentStore};

// Two 5 MiB documents plus the text fields, with headroom for encoding
const MAX_UPLOAD_BODY_BYTES: usize = 12 * 1024 * 1024;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,unimarket_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let storage_root = env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage/public".to_string());
    let debug = env::var("APP_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let state = AppState {
        db,
        documents: DocumentStore::new(storage_root),
        debug,
    };

    // Build router
    let app = Router::new()
        .route("/", get(health))
        .route(
            "/api/agent-application/status",
            get(handlers::agent_application::get_application_status),
        )
        .route(
            "/api/agent-application/submit",
            post(handlers::agent_application::submit_application),
        )
        .route(
            "/api/admin/agent-applications/list",
            get(handlers::admin_applications::list_applications),
        )
        .route(
            "/api/admin/agent-applications/{id}",
            get(handlers::admin_applications::show_application),
        )
        .route(
            "/api/admin/agent-applications/{id}/approve",
            post(handlers::admin_applications::approve_application),
        )
        .route(
            "/api/admin/agent-applications/{id}/reject",
            post(handlers::admin_applications::reject_application),
        )
        .route(
            "/api/admin/agent-applications/{id}/documents/{kind}",
            get(handlers::admin_applications::download_document),
        )
        .route(
            "/api/agent/dashboard-ui",
            get(handlers::agent_dashboard::get_dashboard),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn health() -> &'static str {
    "UniMarket agent program backend"
}
