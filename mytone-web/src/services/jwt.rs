use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::dtos::auth::SessionUser;
use crate::models::{Identity, Role};

/// Signs and validates session tokens (HS256, single process-wide secret).
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    max_age: Duration,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (identity ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
    /// Upstream bearer token, delegated strategy only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub jti: String,
}

impl SessionClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.sub.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Tokens handed out by the upstream auth API at login.
#[derive(Debug, Clone, Default)]
pub struct UpstreamTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

impl SessionIssuer {
    pub fn new(secret: &Secret<String>, max_age_days: i64) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            max_age: Duration::days(max_age_days),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let issuer = Self::new(&config.secret, config.max_age_days);
        tracing::info!(
            max_age_days = config.max_age_days,
            "Session issuer initialized with HS256"
        );
        issuer
    }

    pub fn issue(
        &self,
        identity: &Identity,
        upstream: Option<UpstreamTokens>,
    ) -> Result<IssuedSession, jsonwebtoken::errors::Error> {
        self.issue_at(identity, upstream, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        upstream: Option<UpstreamTokens>,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, jsonwebtoken::errors::Error> {
        let (access_token, refresh_token) = match upstream {
            Some(tokens) => (Some(tokens.access_token), tokens.refresh_token),
            None => (None, None),
        };

        let claims = SessionClaims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            name: identity.display_name.clone(),
            role: identity.role,
            access_token,
            refresh_token,
            iat: now.timestamp(),
            exp: (now + self.max_age).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.sign(&claims)?;
        Ok(IssuedSession { token, claims })
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }

    /// Validate signature and expiry.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        decode::<SessionClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }

    /// Re-sign a still-valid token. The payload, expiry included, is unchanged.
    pub fn refresh_claims(
        &self,
        token: &str,
    ) -> Result<IssuedSession, jsonwebtoken::errors::Error> {
        let claims = self.decode(token)?;
        let token = self.sign(&claims)?;
        Ok(IssuedSession { token, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(&Secret::new("test-session-secret".to_string()), 30)
    }

    fn identity(role: Role) -> Identity {
        Identity {
            id: "42".to_string(),
            email: Some("ada@example.com".to_string()),
            username: Some("ada".to_string()),
            display_name: Some("Ada Lovelace".to_string()),
            role,
        }
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let issuer = issuer();
        let tokens = UpstreamTokens {
            access_token: "up-access".to_string(),
            refresh_token: Some("up-refresh".to_string()),
        };
        let issued = issuer.issue(&identity(Role::Admin), Some(tokens)).unwrap();

        let decoded = issuer.decode(&issued.token).unwrap();
        assert_eq!(decoded, issued.claims);
        assert_eq!(decoded.role, Role::Admin);
        assert_eq!(decoded.access_token.as_deref(), Some("up-access"));
        assert_eq!(decoded.exp - decoded.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer();
        let long_ago = Utc::now() - Duration::days(31);
        let issued = issuer.issue_at(&identity(Role::User), None, long_ago).unwrap();

        assert!(issuer.decode(&issued.token).is_err());
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let other = SessionIssuer::new(&Secret::new("another-secret".to_string()), 30);
        let issued = other.issue(&identity(Role::User), None).unwrap();

        assert!(issuer().decode(&issued.token).is_err());
    }

    #[test]
    fn test_refresh_keeps_expiry() {
        let issuer = issuer();
        let issued = issuer.issue(&identity(Role::User), None).unwrap();

        let refreshed = issuer.refresh_claims(&issued.token).unwrap();
        assert_eq!(refreshed.claims.exp, issued.claims.exp);
        assert_eq!(refreshed.claims.jti, issued.claims.jti);
        assert!(issuer.decode(&refreshed.token).is_ok());
    }
}
