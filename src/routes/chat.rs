use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::models::{AppState, ChatResponse, SendMessageRequest};
use crate::routes::sessions::find_session;
use crate::session::SendOutcome;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/{session_id}/messages", post(post_message))
        .with_state(state)
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> AppResult<Json<ChatResponse>> {
    info!(
        session_id = %session_id,
        message_len = request.message.len(),
        "Received chat message"
    );

    let handle = find_session(&state, &session_id).await?;
    let (outcome, session) = handle.send(&request.message).await;

    let reply = match outcome {
        SendOutcome::Replied | SendOutcome::NeedsDocument | SendOutcome::Failed => {
            session.messages.last().cloned()
        }
        SendOutcome::IgnoredBlank | SendOutcome::IgnoredBusy => None,
    };

    info!(session_id = %session_id, outcome = ?outcome, "Chat message handled");

    Ok(Json(ChatResponse {
        outcome,
        reply,
        session,
    }))
}
