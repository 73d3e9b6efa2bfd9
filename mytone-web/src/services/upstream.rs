//! Client for the external MyTone auth API.

use axum::http::StatusCode;
use mytone_core::observability::{TracedClientExt, TracedRequest};
use serde::Deserialize;
use serde_json::Value;

use crate::dtos::auth::{UpstreamRegisterRequest, UpstreamResetRequest};
use crate::models::{Identity, Role};
use crate::services::error::ServiceError;

const DEFAULT_UPSTREAM_ERROR: &str = "Upstream service error";

#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

/// Successful `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamLogin {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `GET /auth/me` body. Only the fields we map onto an identity.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamProfile {
    pub id: Value,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UpstreamProfile {
    pub fn into_identity(self) -> Identity {
        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let display_name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.username.clone());
        let role = self
            .role
            .as_deref()
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or_default();

        Identity {
            id,
            email: self.email,
            username: self.username,
            display_name,
            role,
        }
    }
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        request_id: Option<&str>,
    ) -> Result<UpstreamLogin, ServiceError> {
        let response = self
            .client
            .traced_post(&self.url("/auth/login"))
            .form(&[("username", identifier), ("password", password)])
            .request_id(request_id)
            .send_upstream("/auth/login")
            .await?;

        read_json(response).await
    }

    pub async fn me(
        &self,
        access_token: &str,
        request_id: Option<&str>,
    ) -> Result<UpstreamProfile, ServiceError> {
        let response = self
            .client
            .traced_get(&self.url("/auth/me"))
            .bearer_auth(access_token)
            .request_id(request_id)
            .send_upstream("/auth/me")
            .await?;

        read_json(response).await
    }

    pub async fn register(
        &self,
        body: &UpstreamRegisterRequest<'_>,
        request_id: Option<&str>,
    ) -> Result<Value, ServiceError> {
        let response = self
            .client
            .traced_post(&self.url("/auth/register"))
            .json(body)
            .request_id(request_id)
            .send_upstream("/auth/register")
            .await?;

        read_json(response).await
    }

    pub async fn forgot_password(
        &self,
        email: &str,
        request_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .traced_post(&self.url("/auth/forgot-password"))
            .json(&serde_json::json!({ "email": email }))
            .request_id(request_id)
            .send_upstream("/auth/forgot-password")
            .await?;

        expect_success(response).await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        request_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .traced_post(&self.url("/auth/reset-password"))
            .json(&UpstreamResetRequest {
                token,
                new_password,
            })
            .request_id(request_id)
            .send_upstream("/auth/reset-password")
            .await?;

        expect_success(response).await
    }
}

trait SendUpstream {
    async fn send_upstream(self, endpoint: &'static str) -> Result<reqwest::Response, ServiceError>;
}

impl SendUpstream for TracedRequest {
    async fn send_upstream(self, endpoint: &'static str) -> Result<reqwest::Response, ServiceError> {
        self.send().await.map_err(|e| {
            tracing::error!(error = %e, endpoint, "Upstream request failed");
            ServiceError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Upstream service unavailable".to_string(),
            }
        })
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    if !response.status().is_success() {
        return Err(failure(response).await);
    }

    response.json::<T>().await.map_err(|e| {
        tracing::error!(error = %e, "Malformed upstream response");
        ServiceError::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Malformed upstream response".to_string(),
        }
    })
}

async fn expect_success(response: reqwest::Response) -> Result<(), ServiceError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(failure(response).await)
    }
}

async fn failure(response: reqwest::Response) -> ServiceError {
    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap_or_default();
    let message = extract_upstream_message(&body, DEFAULT_UPSTREAM_ERROR);

    tracing::warn!(status = %status, message = %message, "Upstream rejected request");
    ServiceError::Upstream { status, message }
}

/// Best-effort human message from an upstream error body.
///
/// Tried in order: `detail` string, first element of a `detail` array (its
/// `msg`, or the element itself when it is a string), `error` string,
/// `message` string, then the raw body when it is not JSON.
pub fn extract_upstream_message(body: &str, default: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        let raw = body.trim();
        return if raw.is_empty() {
            default.to_string()
        } else {
            raw.to_string()
        };
    };

    match json.get("detail") {
        Some(Value::String(detail)) => return detail.clone(),
        Some(Value::Array(items)) => {
            if let Some(first) = items.first() {
                match first {
                    Value::String(s) => return s.clone(),
                    other => {
                        if let Some(msg) = other.get("msg").and_then(Value::as_str) {
                            return msg.to_string();
                        }
                    }
                }
            }
        }
        _ => {}
    }

    ["error", "message"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        let msg = extract_upstream_message(r#"{"detail":"Email already registered"}"#, "x");
        assert_eq!(msg, "Email already registered");
    }

    #[test]
    fn test_detail_array_of_objects() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address","type":"value_error"}]}"#;
        assert_eq!(
            extract_upstream_message(body, "x"),
            "value is not a valid email address"
        );
    }

    #[test]
    fn test_detail_array_of_strings() {
        assert_eq!(extract_upstream_message(r#"{"detail":["nope"]}"#, "x"), "nope");
    }

    #[test]
    fn test_error_then_message_keys() {
        assert_eq!(extract_upstream_message(r#"{"error":"boom"}"#, "x"), "boom");
        assert_eq!(extract_upstream_message(r#"{"message":"later"}"#, "x"), "later");
    }

    #[test]
    fn test_raw_text_and_default() {
        assert_eq!(extract_upstream_message("Bad Gateway", "x"), "Bad Gateway");
        assert_eq!(extract_upstream_message("", "fallback"), "fallback");
        assert_eq!(extract_upstream_message("{}", "fallback"), "fallback");
    }

    #[test]
    fn test_profile_role_defaults_to_user() {
        let profile: UpstreamProfile =
            serde_json::from_str(r#"{"id":12,"email":"a@b.c","name":"Ada"}"#).unwrap();
        let identity = profile.into_identity();
        assert_eq!(identity.id, "12");
        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let profile: UpstreamProfile =
            serde_json::from_str(r#"{"id":"u-7","username":"ada","name":""}"#).unwrap();
        let identity = profile.into_identity();
        assert_eq!(identity.display_name.as_deref(), Some("ada"));
        assert_eq!(identity.username.as_deref(), Some("ada"));
    }
}
