use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::agents::{FileUploadAgent, UploadedDocument};
use crate::models::{AppState, UploadResponse};
use crate::routes::sessions::find_session;
use crate::session::UploadOutcome;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/{session_id}/files", post(upload_files))
        .with_state(state)
}

/// Accepts a batch of files; only the first allowed one is processed.
async fn upload_files(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let handle = find_session(&state, &session_id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        debug!(filename = %filename, bytes = data.len(), "Received file part");
        files.push(UploadedDocument::from_part(
            Some(&filename),
            content_type.as_deref(),
            data.to_vec(),
        ));
    }

    if files.is_empty() {
        return Err(AppError::InvalidRequest("No files in upload".to_string()));
    }

    info!(session_id = %session_id, files = files.len(), "File upload request received");

    let batch = FileUploadAgent::validate_batch(files);
    let notice = batch.notice;

    let Some(first) = batch.accepted.into_iter().next() else {
        let session = handle.snapshot().await;
        return Ok((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(UploadResponse {
                notice,
                outcome: UploadOutcome::Rejected,
                session,
            }),
        ));
    };

    let (outcome, session) = handle.upload(first).await;

    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            notice,
            outcome,
            session,
        }),
    ))
}
