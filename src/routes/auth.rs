use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};

use crate::middleware::{get_user, Claims};
use crate::models::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/me", get(current_user))
        .with_state(state)
}

/// GET /api/auth/me - Claims from the `token` cookie, or null
async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Json<Option<Claims>> {
    Json(get_user(&headers, &state.config.auth.secret))
}
