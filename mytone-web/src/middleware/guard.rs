//! Request-level route guard.
//!
//! Rules, first match wins:
//! 1. protected page without a valid session: redirect to `/login/user`;
//! 2. login/sign-up page navigation with a valid session: redirect to `/`;
//! 3. otherwise pass, with the decoded session stored in the request.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::middleware::session::{session_token, CurrentSession};
use crate::AppState;

pub const PROTECTED_PREFIXES: [&str; 4] = ["/dashboard", "/profile", "/settings", "/admin"];

pub const AUTH_ENTRY_POINTS: [&str; 2] = ["/login/user", "/signup"];

pub const USER_LOGIN_PAGE: &str = "/login/user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(&'static str),
}

/// `/admin` covers `/admin` and `/admin/...` but not `/administrator`.
fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn is_navigation(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

pub fn evaluate(path: &str, method: &Method, authenticated: bool) -> GuardDecision {
    if !authenticated && PROTECTED_PREFIXES.iter().any(|p| under_prefix(path, p)) {
        return GuardDecision::Redirect(USER_LOGIN_PAGE);
    }

    if authenticated
        && is_navigation(method)
        && AUTH_ENTRY_POINTS.iter().any(|p| under_prefix(path, p))
    {
        return GuardDecision::Redirect("/");
    }

    GuardDecision::Pass
}

pub async fn session_guard_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = session_token(&jar, req.headers(), &state.config.session.cookie_name)
        .and_then(|token| match state.sessions.decode(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
                None
            }
        });

    let path = req.uri().path().to_string();
    match evaluate(&path, req.method(), session.is_some()) {
        GuardDecision::Redirect(to) => {
            tracing::debug!(path = %path, to, "Route guard redirect");
            Redirect::to(to).into_response()
        }
        GuardDecision::Pass => {
            req.extensions_mut().insert(CurrentSession(session));
            next.run(req).await
        }
    }
}
