use std::sync::OnceLock;

use axum::{response::Html, routing::get, Router};

use crate::agents::file_upload::{ACCEPTED_EXTENSIONS, ALLOWED_MIME_TYPES};

const PAGE_TEMPLATE: &str = include_str!("../../assets/index.html");

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(page())
}

/// The chat page with the upload filters filled in. Rendered once.
fn page() -> &'static str {
    static PAGE: OnceLock<String> = OnceLock::new();

    PAGE.get_or_init(|| {
        let allowed = serde_json::to_string(&ALLOWED_MIME_TYPES).unwrap_or_else(|_| "[]".to_string());

        PAGE_TEMPLATE
            .replace("{{ACCEPTED_EXTENSIONS}}", ACCEPTED_EXTENSIONS)
            .replace("{{ALLOWED_MIME_TYPES}}", &allowed)
    })
}
