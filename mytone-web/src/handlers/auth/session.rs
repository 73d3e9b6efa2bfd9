use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use mytone_core::error::AppError;
use mytone_core::middleware::tracing::RequestId;
use tracing::{info, instrument};

use crate::{
    dtos::auth::{LoginForm, LoginResponse, SessionResponse},
    handlers::request_id,
    middleware::session::{removal_cookie, session_cookie, session_token, MaybeSession},
    services::{Credentials, IssuedSession, ServiceError},
    utils::{FormBody, Password},
    AppState,
};

fn with_cookie(state: &AppState, jar: CookieJar, issued: &IssuedSession) -> CookieJar {
    let max_age = (issued.claims.exp - Utc::now().timestamp()).max(0);
    jar.add(session_cookie(
        &state.config.session,
        issued.token.clone(),
        max_age,
    ))
}

/// Verify credentials and open a session.
#[instrument(skip(state, jar, form, rid), fields(user_type = ?form.user_type))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    rid: Option<Extension<RequestId>>,
    FormBody(form): FormBody<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let expected_role = form.expected_role();
    let credentials = Credentials {
        identifier: form.username.trim().to_string(),
        password: Password::new(form.password),
    };

    let verified = state
        .verifier
        .verify(&credentials, expected_role, request_id(&rid))
        .await?;

    let issued = state
        .sessions
        .issue(&verified.identity, verified.upstream)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to sign session: {}", e)))?;
    info!(sub = %issued.claims.sub, role = issued.claims.role.as_str(), "Session opened");

    let jar = with_cookie(&state, jar, &issued);
    let body = LoginResponse {
        user: issued.claims.user(),
        expires_at: issued.claims.exp,
        redirect: issued.claims.role.home().to_string(),
    };

    Ok((jar, Json(body)))
}

/// Drop the session cookie. The token stays valid until it expires.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(removal_cookie(&state.config.session)),
        StatusCode::NO_CONTENT,
    )
}

pub async fn current_session(MaybeSession(session): MaybeSession) -> Json<serde_json::Value> {
    let body = match session {
        Some(claims) => serde_json::to_value(SessionResponse {
            user: claims.user(),
            expires_at: claims.exp,
        })
        .unwrap_or_else(|_| serde_json::json!({})),
        None => serde_json::json!({}),
    };
    Json(body)
}

/// Re-sign the presented token. Its payload and expiry do not change.
pub async fn refresh_session(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = session_token(&jar, &headers, &state.config.session.cookie_name)
        .ok_or(ServiceError::Unauthenticated)?;

    let issued = state.sessions.refresh_claims(&token)?;
    let jar = with_cookie(&state, jar, &issued);

    Ok((
        jar,
        Json(SessionResponse {
            user: issued.claims.user(),
            expires_at: issued.claims.exp,
        }),
    ))
}
