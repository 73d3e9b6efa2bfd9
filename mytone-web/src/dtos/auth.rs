use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Identity, Role};

/// Form posted by the login pages.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default, alias = "identifier")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "userType")]
    pub user_type: Option<String>,
}

impl LoginForm {
    /// Role the caller is signing in as. Anything but `admin` means a user.
    pub fn expected_role(&self) -> Role {
        match self.user_type.as_deref() {
            Some(kind) if kind.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Identity fields of a session that are safe to hand to the browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
}

impl From<&Identity> for SessionUser {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            name: identity.display_name.clone(),
            role: identity.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: SessionUser,
    pub expires_at: i64,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: SessionUser,
    pub expires_at: i64,
}

/// Sign-up payload. Fields default to empty so a missing one is reported as
/// "All fields are required" rather than a JSON parse error.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn is_complete(&self) -> bool {
        [
            &self.name,
            &self.surname,
            &self.email,
            &self.username,
            &self.password,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: serde_json::Value,
}

/// Body forwarded to the upstream registration endpoint.
#[derive(Debug, Serialize)]
pub struct UpstreamRegisterRequest<'a> {
    pub name: &'a str,
    pub surname: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub phone_number: Option<String>,
    pub type_client: u8,
}

impl<'a> From<&'a RegisterRequest> for UpstreamRegisterRequest<'a> {
    fn from(req: &'a RegisterRequest) -> Self {
        Self {
            name: &req.name,
            surname: &req.surname,
            email: &req.email,
            username: &req.username,
            password: &req.password,
            phone_number: None,
            type_client: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 10, message = "Password must be at least 10 characters"))]
    pub password: String,
    /// Must repeat `password`; a missing confirmation never matches.
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
}

impl ResetPasswordRequest {
    pub fn confirmation_matches(&self) -> bool {
        !self.confirm_password.is_empty() && self.confirm_password == self.password
    }
}

#[derive(Debug, Serialize)]
pub struct UpstreamResetRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_accepts_identifier_alias() {
        let form: LoginForm =
            serde_json::from_str(r#"{"identifier":"ada","password":"pw","userType":"admin"}"#)
                .unwrap();
        assert_eq!(form.username, "ada");
        assert_eq!(form.expected_role(), Role::Admin);
    }

    #[test]
    fn test_register_request_completeness() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"name":"Ada","surname":" ","email":"a@b.c","username":"ada","password":"pw"}"#)
                .unwrap();
        assert!(!req.is_complete());
    }

    #[test]
    fn test_upstream_register_body_shape() {
        let req = RegisterRequest {
            name: "Ada".into(),
            surname: "Lovelace".into(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            password: "secret".into(),
        };
        let body = serde_json::to_value(UpstreamRegisterRequest::from(&req)).unwrap();
        assert_eq!(body["phone_number"], serde_json::Value::Null);
        assert_eq!(body["type_client"], 0);
    }

    #[test]
    fn test_reset_confirmation() {
        let mut req = ResetPasswordRequest {
            token: "t".into(),
            password: "longenough1".into(),
            confirm_password: String::new(),
        };
        assert!(!req.confirmation_matches());
        req.confirm_password = "different11".into();
        assert!(!req.confirmation_matches());
        req.confirm_password = "longenough1".into();
        assert!(req.confirmation_matches());
    }
}
