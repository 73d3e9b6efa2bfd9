//! Session cookie handling and the extractors handlers use to read the
//! session the guard decoded.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use mytone_core::error::AppError;

use crate::config::SessionConfig;
use crate::services::{ServiceError, SessionClaims};

/// Decoded session placed in request extensions by the guard.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<SessionClaims>);

/// Token from the session cookie, else from `Authorization: Bearer`.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub fn session_cookie(config: &SessionConfig, token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Expired, empty cookie that makes the browser drop the session.
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}

fn current(parts: &Parts) -> Option<SessionClaims> {
    parts
        .extensions
        .get::<CurrentSession>()
        .and_then(|current| current.0.clone())
}

/// The session if there is one. Never rejects.
pub struct MaybeSession(pub Option<SessionClaims>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(current(parts)))
    }
}

/// API access for admins; 401 without a session, 403 for other roles.
pub struct AdminSession(pub SessionClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = current(parts).ok_or(ServiceError::Unauthenticated)?;
        if !claims.is_admin() {
            tracing::warn!(sub = %claims.sub, "Non-admin session on admin endpoint");
            return Err(ServiceError::NotAuthorized.into());
        }
        Ok(AdminSession(claims))
    }
}

/// Page for any signed-in identity; redirects to the user login otherwise.
pub struct SignedInPage(pub SessionClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SignedInPage
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current(parts)
            .map(SignedInPage)
            .ok_or_else(|| Redirect::to("/login/user").into_response())
    }
}

/// Admin-only page: no session goes to the admin login, other roles go to
/// their dashboard.
pub struct AdminPage(pub SessionClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminPage
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match current(parts) {
            None => Err(Redirect::to("/login/admin").into_response()),
            Some(claims) if !claims.is_admin() => Err(Redirect::to("/dashboard").into_response()),
            Some(claims) => Ok(AdminPage(claims)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};
    use crate::models::Role;

    fn claims(role: Role) -> SessionClaims {
        SessionClaims {
            sub: "7".to_string(),
            email: None,
            username: Some("someone".to_string()),
            name: None,
            role,
            access_token: None,
            refresh_token: None,
            iat: 0,
            exp: i64::MAX,
            jti: "jti".to_string(),
        }
    }

    fn parts_with(session: Option<SessionClaims>) -> Parts {
        let (mut parts, _) = Request::builder().uri("/admin").body(()).unwrap().into_parts();
        parts.extensions.insert(CurrentSession(session));
        parts
    }

    async fn admin_page_redirect(session: Option<SessionClaims>) -> Option<String> {
        match AdminPage::from_request_parts(&mut parts_with(session), &()).await {
            Ok(_) => None,
            Err(response) => response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_admin_page_without_session_goes_to_admin_login() {
        assert_eq!(admin_page_redirect(None).await.as_deref(), Some("/login/admin"));
    }

    #[tokio::test]
    async fn test_admin_page_role_refinement() {
        assert_eq!(
            admin_page_redirect(Some(claims(Role::User))).await.as_deref(),
            Some("/dashboard")
        );
        assert_eq!(admin_page_redirect(Some(claims(Role::Admin))).await, None);
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let jar = CookieJar::new().add(Cookie::new("mytone_session", "from-cookie"));

        assert_eq!(
            session_token(&jar, &headers, "mytone_session").as_deref(),
            Some("from-cookie")
        );
        assert_eq!(
            session_token(&CookieJar::new(), &headers, "mytone_session").as_deref(),
            Some("from-header")
        );
        assert_eq!(session_token(&CookieJar::new(), &HeaderMap::new(), "mytone_session"), None);
    }
}
