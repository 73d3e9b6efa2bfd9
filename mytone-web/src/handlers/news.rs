use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mytone_core::error::AppError;
use tracing::{info, instrument};

use crate::{
    dtos::news::{CreateNewsRequest, NewsQuery},
    middleware::AdminSession,
    models::{Language, LocalizedNews},
    services::ServiceError,
    utils::{QueryParams, ValidatedJson},
    AppState,
};

/// All news, newest first. With `?lang=` each item is projected onto that
/// language, falling back to English.
pub async fn list_news(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NewsQuery>,
) -> Result<Response, AppError> {
    let items = state.news.list_news().await?;

    match query.lang.as_deref() {
        None => Ok(Json(items).into_response()),
        Some(code) => {
            let lang: Language = code.parse().map_err(ServiceError::Validation)?;
            let localized: Vec<LocalizedNews> =
                items.iter().map(|item| item.localized(lang)).collect();
            Ok(Json(localized).into_response())
        }
    }
}

#[instrument(skip_all, fields(admin = %session.sub))]
pub async fn create_news(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    ValidatedJson(req): ValidatedJson<CreateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = req.into_draft().ok_or_else(|| {
        ServiceError::Validation("English title and description are required".to_string())
    })?;

    let item = state.news.create_news(draft).await?;
    info!(news_id = item.id, "News published");

    Ok((StatusCode::CREATED, Json(item)))
}
