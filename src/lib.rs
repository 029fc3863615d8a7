pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod platform;
pub mod services;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{AuthProvider, SessionGate, UploadSettings, Workspaces};
use crate::storage::StorageManager;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<SessionGate>,
    pub workspaces: Arc<Workspaces>,
}

impl AppState {
    pub fn new(config: Config, auth: Arc<dyn AuthProvider>, storage: StorageManager) -> Self {
        let gate = SessionGate::new(auth, config.platform.jwt_secret.clone());
        let workspaces = Workspaces::with_idle_timeout(
            Arc::new(storage),
            UploadSettings::from(&config),
            config.session.workspace_idle(),
        );

        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            workspaces: Arc::new(workspaces),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth", post(handlers::auth::submit))
        .route("/auth/sign-in", post(handlers::auth::sign_in))
        .route("/auth/sign-up", post(handlers::auth::sign_up));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/sign-out", post(handlers::auth::sign_out))
        .route("/workspace", get(handlers::file::workspace))
        .route(
            "/files",
            get(handlers::file::list_files).post(handlers::file::upload_file),
        )
        .route("/folders", get(handlers::file::list_folders))
        .route("/files/:id", delete(handlers::file::delete_file))
        .route("/files/:id/download", get(handlers::file::download_file))
        .route("/files/:id/preview", get(handlers::file::preview_file))
        .layer(DefaultBodyLimit::max(state.config.uploads.max_bytes))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
