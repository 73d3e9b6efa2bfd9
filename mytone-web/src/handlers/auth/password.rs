use axum::{extract::State, http::StatusCode, Extension};
use mytone_core::error::AppError;
use mytone_core::middleware::tracing::RequestId;

use crate::{
    dtos::auth::{ForgotPasswordRequest, ResetPasswordRequest},
    handlers::request_id,
    services::ServiceError,
    utils::ValidatedJson,
    AppState,
};

/// Ask the upstream API to mail a reset link.
pub async fn forgot_password(
    State(state): State<AppState>,
    rid: Option<Extension<RequestId>>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<StatusCode, AppError> {
    state
        .upstream
        .forgot_password(&req.email, request_id(&rid))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_password(
    State(state): State<AppState>,
    rid: Option<Extension<RequestId>>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    if !req.confirmation_matches() {
        return Err(ServiceError::Validation("Passwords do not match".to_string()).into());
    }

    state
        .upstream
        .reset_password(&req.token, &req.password, request_id(&rid))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
