use axum::{routing::get, Json, Router};

use crate::models::{ModelId, ModelInfo};

pub fn router() -> Router {
    Router::new().route("/api/models", get(list_models))
}

/// GET /api/models - Options for the (cosmetic) model picker
async fn list_models() -> Json<Vec<ModelInfo>> {
    Json(ModelId::ALL.into_iter().map(ModelInfo::from).collect())
}
