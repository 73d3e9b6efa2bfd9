//! HTTP handlers for mytone-web.

pub mod apk;
pub mod auth;
pub mod health;
pub mod news;
pub mod pages;

use axum::Extension;
use mytone_core::middleware::tracing::RequestId;

pub(crate) fn request_id(ext: &Option<Extension<RequestId>>) -> Option<&str> {
    ext.as_ref().map(|Extension(id)| id.0.as_str())
}
