//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/sessions` - Create and inspect chat sessions, change UI settings
//! - `/api/sessions/{id}/messages` - Ask a question about the active document
//! - `/api/sessions/{id}/files` - Upload a document (multipart)
//! - `/api/models` - Model picker options
//! - `/api/auth/me` - Token stub, returns the cookie user or null
//! - `/api/health` - Health checks
//! - `/` - Embedded chat page

pub mod auth;
pub mod chat;
pub mod files;
pub mod health;
pub mod models;
pub mod sessions;
pub mod ui;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
///
/// Routes are organized as follows:
/// - API routes are prefixed with `/api/`
/// - The chat page is served from root `/`
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_upload_bytes = state.config.server.max_upload_bytes;
    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(sessions::router(state.clone()))
        .merge(chat::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(auth::router(state.clone()))
        .merge(health::router(state))
        .merge(models::router());

    let router = Router::new()
        .merge(api_router)
        .merge(ui::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}
