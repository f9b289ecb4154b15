//! Starke contact backend HTTP server.

pub mod api;
pub mod api_admin;
pub mod api_budgets;
pub mod api_login;
pub mod api_messages;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use starke_auth::Authenticator;
use starke_db::StorageLocator;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Owner of the database file location.
    pub storage: Arc<StorageLocator>,
    /// Admin login and token verification.
    pub auth: Arc<Authenticator>,
    /// Origins allowed by CORS; `"*"` allows any.
    pub allowed_origins: Vec<String>,
    /// Largest database image the restore route accepts.
    pub max_backup_bytes: usize,
}

/// Maximum request body size (2 MiB) outside the restore route.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Default for [`AppState::max_backup_bytes`] (64 MiB).
pub const DEFAULT_MAX_BACKUP_BYTES: usize = 64 * 1024 * 1024;

/// Body limit for `POST /api/db-admin/restore`: the base64 encoding of a
/// `max_backup_bytes` image plus room for the JSON wrapper.
pub fn restore_body_limit(max_backup_bytes: usize) -> usize {
    max_backup_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(4096)
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/messages", get(api_messages::list_messages_handler))
        .route(
            "/api/messages/{id}",
            get(api_messages::get_message_handler)
                .put(api_messages::update_message_handler)
                .delete(api_messages::delete_message_handler),
        )
        .route("/api/budgets", get(api_budgets::list_budgets_handler))
        .route(
            "/api/budgets/{id}",
            get(api_budgets::get_budget_handler)
                .put(api_budgets::update_budget_handler)
                .delete(api_budgets::delete_budget_handler),
        )
        .route("/api/db-admin", get(api_admin::info_handler))
        .route("/api/db-admin/backup", get(api_admin::backup_handler))
        .route("/api/db-admin/init", post(api_admin::init_handler))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    let restore_routes = Router::new()
        .route("/api/db-admin/restore", post(api_admin::restore_handler))
        .layer(DefaultBodyLimit::max(restore_body_limit(
            state.max_backup_bytes,
        )))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    // Form submissions are public; the same paths list records for admins.
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/login", post(api_login::login_handler))
        .route("/api/logout", post(api_login::logout_handler))
        .route("/api/messages", post(api_messages::create_message_handler))
        .route("/api/budgets", post(api_budgets::create_budget_handler));

    let cors = cors_layer(&state.allowed_origins);

    public_routes
        .merge(protected_routes)
        .merge(restore_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
