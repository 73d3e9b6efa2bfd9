use mytone_core::config::ServerConfig;
use mytone_core::error::AppError;
use secrecy::{ExposeSecret, Secret};
use std::env;

/// Upper bound for a session's lifetime.
pub const MAX_SESSION_AGE_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub server: ServerConfig,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

/// How credentials are resolved. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Users and admins live in our own database; passwords are checked here.
    LocalStore,
    /// Login and registration are delegated to the upstream auth API.
    DelegatedApi,
}

impl AuthStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStrategy::LocalStore => "local",
            AuthStrategy::DelegatedApi => "delegated",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub strategy: AuthStrategy,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: Secret<String>,
    pub max_age_days: i64,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub region: String,
    pub bucket: Option<String>,
    pub local_path: String,
    /// Base URL this service is reachable at; local signed links point here.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl WebConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let server = ServerConfig::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let storage_backend: StorageBackend = get_env("STORAGE_BACKEND", Some("s3"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let config = WebConfig {
            server,
            environment,
            service_name: get_env("SERVICE_NAME", Some("mytone-web"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            auth: AuthConfig {
                strategy: get_env("AUTH_STRATEGY", Some("local"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            session: SessionConfig {
                secret: Secret::new(get_env("SESSION_SECRET", None, is_prod)?),
                max_age_days: parse_env("SESSION_MAX_AGE_DAYS", "30", is_prod)?,
                cookie_name: get_env("SESSION_COOKIE_NAME", Some("mytone_session"), is_prod)?,
                secure_cookie: parse_env(
                    "SESSION_SECURE_COOKIE",
                    if is_prod { "true" } else { "false" },
                    is_prod,
                )?,
            },
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "5", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            upstream: UpstreamConfig {
                base_url: get_env(
                    "UPSTREAM_API_URL",
                    Some("https://api-mytone.onrender.com"),
                    is_prod,
                )?
                .trim_end_matches('/')
                .to_string(),
            },
            storage: StorageConfig {
                backend: storage_backend,
                region: get_env("AWS_REGION", Some("eu-central-1"), is_prod)?,
                bucket: match storage_backend {
                    StorageBackend::S3 => Some(get_env("AWS_S3_BUCKET_NAME", None, is_prod)?),
                    StorageBackend::Local => env::var("AWS_S3_BUCKET_NAME").ok(),
                },
                local_path: get_env("STORAGE_LOCAL_PATH", Some("./storage"), false)?,
                public_base_url: get_env(
                    "PUBLIC_BASE_URL",
                    Some("http://localhost:8080"),
                    is_prod,
                )?
                .trim_end_matches('/')
                .to_string(),
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.server.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "APP__PORT must be greater than 0"
            )));
        }

        if !(1..=MAX_SESSION_AGE_DAYS).contains(&self.session.max_age_days) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_MAX_AGE_DAYS must be between 1 and {}",
                MAX_SESSION_AGE_DAYS
            )));
        }

        if self.session.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_SECRET must not be empty"
            )));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "AWS_S3_BUCKET_NAME is required for the s3 storage backend"
            )));
        }

        if self.environment == Environment::Prod {
            if self.session.secret.expose_secret().len() < 32 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SESSION_SECRET must be at least 32 bytes in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if !self.session.secure_cookie {
                tracing::warn!("Session cookie is not marked Secure in production");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for AuthStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(AuthStrategy::LocalStore),
            "delegated" => Ok(AuthStrategy::DelegatedApi),
            _ => Err(format!("Invalid auth strategy: {}", s)),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}
