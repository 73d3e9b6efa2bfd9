use axum::{http::header, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "mytone-web",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        mytone_core::observability::metrics::get_metrics(),
    )
}
