//! Credential verification, sessions, stores and upstream access.

pub mod credentials;
pub mod database;
pub mod error;
mod jwt;
pub mod memory;
pub mod storage;
pub mod upstream;

pub use credentials::{CredentialVerifier, Credentials, VerifiedIdentity};
pub use database::{Database, IdentityStore, NewsStore};
pub use error::ServiceError;
pub use jwt::{IssuedSession, SessionClaims, SessionIssuer, UpstreamTokens};
pub use memory::InMemoryStore;
pub use storage::{ArtifactStorage, LocalStorage, S3Storage, APK_CONTENT_TYPE, APK_KEY};
pub use upstream::{extract_upstream_message, UpstreamClient};
