use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use mytone_core::error::AppError;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::dtos::ErrorBody;

/// JSON body extractor that runs `validator` rules before the handler.
/// Parse failures and rule violations both answer 400 `{"error": ...}`.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(format!("Json parse error: {}", e))),
            )
                .into_response()
        })?;

        value
            .validate()
            .map_err(|e| AppError::ValidationError(e).into_response())?;

        Ok(ValidatedJson(value))
    }
}

fn bad_request(rejection: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(rejection.to_string()))
}

/// `application/x-www-form-urlencoded` body; rejections use the JSON error
/// envelope.
pub struct FormBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for FormBody<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        Ok(FormBody(value))
    }
}

/// Query string parameters; rejections use the JSON error envelope.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        Ok(QueryParams(value))
    }
}

/// Multipart upload body; a missing or malformed boundary answers 400
/// `{"error": ...}`.
pub struct ApkMultipart(pub Multipart);

#[axum::async_trait]
impl<S> FromRequest<S> for ApkMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(ApkMultipart)
            .map_err(|e| bad_request(e.body_text()))
    }
}
