use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::models::{AppState, SessionSnapshot, UpdateSettingsRequest};
use crate::session::{ChatSession, SessionHandle};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{session_id}", get(get_session))
        .route("/api/sessions/{session_id}/settings", patch(update_settings))
        .with_state(state)
}

/// Look up a session or fail with 404
pub(crate) async fn find_session(state: &AppState, session_id: &Uuid) -> AppResult<SessionHandle> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {}", session_id)))
}

async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let session = ChatSession::new(state.config.chat.default_temperature);
    let handle = state.sessions.insert(session).await;
    let snapshot = handle.snapshot().await;

    info!(session_id = %snapshot.id, "Session created");

    (StatusCode::CREATED, Json(snapshot))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    let handle = find_session(&state, &session_id).await?;
    Ok(Json(handle.snapshot().await))
}

/// Presentation controls. None of these change how replies are found.
async fn update_settings(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SessionSnapshot>> {
    let handle = find_session(&state, &session_id).await?;

    let snapshot = handle
        .update(|session| {
            if let Some(model) = request.model {
                session.set_model(model);
            }
            if let Some(temperature) = request.temperature {
                session.set_temperature(temperature);
            }
            if let Some(theme) = request.theme {
                session.set_theme(theme);
            }
        })
        .await;

    info!(
        session_id = %session_id,
        model = %snapshot.model,
        temperature = snapshot.temperature,
        theme = ?snapshot.theme,
        "Session settings updated"
    );

    Ok(Json(snapshot))
}
