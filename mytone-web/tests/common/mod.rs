//! Shared setup for mytone-web integration tests: the real router over an
//! in-memory store and a temporary local artifact directory.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use mytone_core::config::ServerConfig;
use mytone_web::{
    build_router,
    config::{
        AuthConfig, AuthStrategy, DatabaseConfig, Environment, SecurityConfig, SessionConfig,
        StorageBackend, StorageConfig, UpstreamConfig, WebConfig,
    },
    models::{Identity, NewUser, Role},
    services::{
        CredentialVerifier, IdentityStore, InMemoryStore, LocalStorage, SessionIssuer,
        UpstreamClient,
    },
    utils::{hash_password, Password},
    AppState,
};
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-session-secret-0123456789";
pub const COOKIE_NAME: &str = "mytone_session";
pub const BOUNDARY: &str = "mytone-test-boundary";

pub fn test_config(strategy: AuthStrategy, upstream_url: &str, storage_path: &str) -> WebConfig {
    WebConfig {
        server: ServerConfig::default(),
        environment: Environment::Dev,
        service_name: "mytone-web-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        auth: AuthConfig { strategy },
        session: SessionConfig {
            secret: Secret::new(TEST_SECRET.to_string()),
            max_age_days: 30,
            cookie_name: COOKIE_NAME.to_string(),
            secure_cookie: false,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        upstream: UpstreamConfig {
            base_url: upstream_url.to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            region: "eu-central-1".to_string(),
            bucket: None,
            local_path: storage_path.to_string(),
            public_base_url: "http://localhost:8080".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub storage_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie the response sets, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{}=", COOKIE_NAME)))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

impl TestApp {
    pub async fn new(strategy: AuthStrategy, upstream_url: &str) -> Self {
        let storage_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = test_config(
            strategy,
            upstream_url,
            storage_dir.path().to_str().expect("Non UTF-8 temp path"),
        );

        let store = Arc::new(InMemoryStore::new());
        let upstream = UpstreamClient::new(upstream_url);
        let verifier = match strategy {
            AuthStrategy::LocalStore => CredentialVerifier::LocalStore(store.clone()),
            AuthStrategy::DelegatedApi => CredentialVerifier::DelegatedApi(upstream.clone()),
        };
        let storage = LocalStorage::new(
            storage_dir.path(),
            &config.storage.public_base_url,
            config.session.secret.clone(),
        )
        .await
        .expect("Failed to create local storage");

        let state = AppState {
            sessions: SessionIssuer::from_config(&config.session),
            verifier,
            identities: store.clone(),
            news: store.clone(),
            storage: Arc::new(storage),
            upstream,
            config,
        };

        Self {
            router: build_router(state.clone()),
            state,
            store,
            storage_dir,
        }
    }

    pub async fn local() -> Self {
        // Port 9 (discard) is never contacted by the local strategy.
        Self::new(AuthStrategy::LocalStore, "http://127.0.0.1:9").await
    }

    /// Local credentials; password reset still goes to `upstream_url`.
    pub async fn local_with_upstream(upstream_url: &str) -> Self {
        Self::new(AuthStrategy::LocalStore, upstream_url).await
    }

    pub async fn delegated(upstream_url: &str) -> Self {
        Self::new(AuthStrategy::DelegatedApi, upstream_url).await
    }

    pub async fn seed_user(&self, email: &str, username: &str, password: &str) {
        let hash = hash_password(&Password::new(password)).expect("Failed to hash");
        self.store
            .insert_user(NewUser {
                name: "Test".to_string(),
                surname: "User".to_string(),
                email: email.to_string(),
                username: username.to_string(),
                password_hash: hash.into_string(),
            })
            .await
            .expect("Failed to seed user");
    }

    pub fn seed_admin(&self, username: &str, password: &str) {
        self.store
            .seed_admin(username, password)
            .expect("Failed to seed admin");
    }

    /// Cookie header value for a freshly issued session with `role`.
    pub fn cookie_for(&self, role: Role) -> String {
        let identity = Identity {
            id: "1".to_string(),
            email: Some("someone@example.com".to_string()),
            username: Some("someone".to_string()),
            display_name: None,
            role,
        };
        let issued = self
            .state
            .sessions
            .issue(&identity, None)
            .expect("Failed to issue session");
        format!("{}={}", COOKIE_NAME, issued.token)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(build(Request::get(uri), cookie).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        self.send(
            build(Request::post(uri), cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        self.send(
            build(Request::post(uri), cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, file_name: &str, data: &[u8], cookie: Option<&str>) -> TestResponse {
        self.send(
            build(Request::post("/apk"), cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_file("file", file_name, data)))
                .unwrap(),
        )
        .await
    }
}

fn build(builder: axum::http::request::Builder, cookie: Option<&str>) -> axum::http::request::Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

pub fn multipart_file(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}
