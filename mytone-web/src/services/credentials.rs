use mytone_core::observability::metrics::record_auth_attempt;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::config::AuthStrategy;
use crate::models::{Identity, Role};
use crate::services::database::IdentityStore;
use crate::services::error::ServiceError;
use crate::services::UpstreamTokens;
use crate::services::upstream::UpstreamClient;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: Password,
}

#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub identity: Identity,
    pub upstream: Option<UpstreamTokens>,
}

/// Resolves identities with the strategy selected at startup.
#[derive(Clone)]
pub enum CredentialVerifier {
    LocalStore(Arc<dyn IdentityStore>),
    DelegatedApi(UpstreamClient),
}

impl CredentialVerifier {
    pub fn strategy(&self) -> AuthStrategy {
        match self {
            CredentialVerifier::LocalStore(_) => AuthStrategy::LocalStore,
            CredentialVerifier::DelegatedApi(_) => AuthStrategy::DelegatedApi,
        }
    }

    pub async fn verify(
        &self,
        credentials: &Credentials,
        expected_role: Role,
        request_id: Option<&str>,
    ) -> Result<VerifiedIdentity, ServiceError> {
        let strategy = self.strategy().as_str();

        if credentials.identifier.trim().is_empty() || credentials.password.as_str().is_empty() {
            record_auth_attempt(strategy, "missing_credentials");
            return Err(ServiceError::MissingCredentials);
        }

        let result = match self {
            CredentialVerifier::LocalStore(store) => {
                verify_local(store.as_ref(), credentials, expected_role).await
            }
            CredentialVerifier::DelegatedApi(upstream) => {
                verify_delegated(upstream, credentials, request_id).await
            }
        }
        .and_then(|verified| {
            if verified.identity.role == expected_role {
                Ok(verified)
            } else {
                warn!(
                    expected = expected_role.as_str(),
                    actual = verified.identity.role.as_str(),
                    "Role mismatch at login"
                );
                Err(ServiceError::InvalidCredentials)
            }
        });

        match &result {
            Ok(verified) => {
                record_auth_attempt(strategy, "success");
                info!(
                    strategy,
                    identity = %verified.identity.id,
                    role = verified.identity.role.as_str(),
                    "Credentials verified"
                );
            }
            Err(e) => {
                record_auth_attempt(strategy, e.kind());
                warn!(strategy, reason = e.kind(), "Credential verification failed");
            }
        }

        result
    }
}

async fn verify_local(
    store: &dyn IdentityStore,
    credentials: &Credentials,
    expected_role: Role,
) -> Result<VerifiedIdentity, ServiceError> {
    let found = match expected_role {
        Role::Admin => store
            .find_admin_by_username(&credentials.identifier)
            .await?
            .map(|admin| (admin.identity(), admin.password)),
        Role::User => store
            .find_user_by_identifier(&credentials.identifier)
            .await?
            .map(|user| (user.identity(), user.password)),
    };

    let Some((identity, hash)) = found else {
        // Unknown identifiers still pay for one Argon2 verification.
        if let Some(absent) = absent_user_hash() {
            let _ = verify_password(&credentials.password, absent);
        }
        return Err(ServiceError::NoSuchUser);
    };

    if !verify_password(&credentials.password, &PasswordHashString::new(hash))? {
        return Err(ServiceError::InvalidPassword);
    }

    Ok(VerifiedIdentity {
        identity,
        upstream: None,
    })
}

/// Hash checked when no account matches, computed once per process.
fn absent_user_hash() -> Option<&'static PasswordHashString> {
    static HASH: OnceLock<Option<PasswordHashString>> = OnceLock::new();
    HASH.get_or_init(|| hash_password(&Password::new("mytone-absent-user")).ok())
        .as_ref()
}

async fn verify_delegated(
    upstream: &UpstreamClient,
    credentials: &Credentials,
    request_id: Option<&str>,
) -> Result<VerifiedIdentity, ServiceError> {
    let login = upstream
        .login(
            &credentials.identifier,
            credentials.password.as_str(),
            request_id,
        )
        .await?;

    let profile = upstream.me(&login.access_token, request_id).await?;

    Ok(VerifiedIdentity {
        identity: profile.into_identity(),
        upstream: Some(UpstreamTokens {
            access_token: login.access_token,
            refresh_token: login.refresh_token,
        }),
    })
}
