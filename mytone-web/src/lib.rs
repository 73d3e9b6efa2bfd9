pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use mytone_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::WebConfig;
use crate::middleware::session_guard_middleware;
use crate::services::{
    ArtifactStorage, CredentialVerifier, IdentityStore, NewsStore, SessionIssuer, UpstreamClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: WebConfig,
    pub sessions: SessionIssuer,
    pub verifier: CredentialVerifier,
    pub identities: Arc<dyn IdentityStore>,
    pub news: Arc<dyn NewsStore>,
    pub storage: Arc<dyn ArtifactStorage>,
    pub upstream: UpstreamClient,
}

pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/login/user", get(handlers::pages::login_user))
        .route("/login/admin", get(handlers::pages::login_admin))
        .route("/signup", get(handlers::pages::signup_page).post(handlers::auth::signup))
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/profile", get(handlers::pages::profile))
        .route("/settings", get(handlers::pages::settings))
        .route("/admin", get(handlers::pages::admin));

    let api = Router::new()
        .route("/auth-login", post(handlers::auth::login))
        .route("/auth-logout", post(handlers::auth::logout))
        .route("/auth-session", get(handlers::auth::current_session))
        .route("/auth-session/refresh", post(handlers::auth::refresh_session))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route(
            "/news",
            get(handlers::news::list_news).post(handlers::news::create_news),
        )
        .route(
            "/apk",
            get(handlers::apk::apk_link)
                .post(handlers::apk::upload_apk)
                .layer(DefaultBodyLimit::max(handlers::apk::MAX_APK_BYTES)),
        )
        .route("/apk/download", get(handlers::apk::signed_download));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .merge(pages)
        .merge(api)
        .layer(from_fn_with_state(state.clone(), session_guard_middleware))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}
