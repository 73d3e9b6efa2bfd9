use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use mytone_core::error::AppError;
use mytone_core::middleware::tracing::RequestId;
use tracing::{info, instrument};

use crate::{
    dtos::auth::{RegisterRequest, RegisterResponse, UpstreamRegisterRequest},
    handlers::request_id,
    models::NewUser,
    services::{CredentialVerifier, IdentityStore, ServiceError},
    utils::{hash_password, Password, ValidatedJson},
    AppState,
};

/// Create an account in the local store, or forward to the upstream API.
#[instrument(skip(state, req, rid), fields(username = %req.username))]
pub async fn signup(
    State(state): State<AppState>,
    rid: Option<Extension<RequestId>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !req.is_complete() {
        return Err(ServiceError::MissingFields.into());
    }

    let user = match &state.verifier {
        CredentialVerifier::LocalStore(store) => register_local(store.as_ref(), req).await?,
        CredentialVerifier::DelegatedApi(upstream) => {
            upstream
                .register(&UpstreamRegisterRequest::from(&req), request_id(&rid))
                .await?
        }
    };

    info!("User registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

async fn register_local(
    store: &dyn IdentityStore,
    req: RegisterRequest,
) -> Result<serde_json::Value, ServiceError> {
    if store.email_exists(&req.email).await? {
        return Err(ServiceError::DuplicateEmail);
    }
    if store.username_exists(&req.username).await? {
        return Err(ServiceError::DuplicateUsername);
    }

    let password_hash = hash_password(&Password::new(req.password))?;
    let record = store
        .insert_user(NewUser {
            name: req.name,
            surname: req.surname,
            email: req.email,
            username: req.username,
            password_hash: password_hash.into_string(),
        })
        .await?;

    serde_json::to_value(record.sanitized()).map_err(|e| ServiceError::Internal(e.into()))
}
