//! Static file responses for the UI pages and the raw state documents.

use std::path::Path;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::warn;

pub const NOT_FOUND_BODY: &str = "Not found";
pub const SERVER_ERROR_BODY: &str = "Server error";

pub fn content_type_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("svg") => "image/svg+xml",
        _ => "text/plain",
    }
}

/// Serves one file. A missing `.json` file answers `{}` so the UI can boot
/// before any state has been saved.
pub async fn serve_file(path: &Path) -> Response {
    let content_type = content_type_for_path(path);
    match tokio::fs::read(path).await {
        Ok(content) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], content).into_response(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            if is_json {
                (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], "{}").into_response()
            } else {
                (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
            }
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read static file");
            (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
        }
    }
}
