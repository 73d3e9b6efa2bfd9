use axum::http::StatusCode;
use mytone_core::error::AppError;
use thiserror::Error;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Identifier and password are required")]
    MissingCredentials,

    #[error("Email already used")]
    DuplicateEmail,

    #[error("Username already used")]
    DuplicateUsername,

    /// No account matches the identifier. Reported to clients exactly like
    /// `InvalidPassword`.
    #[error("No such user")]
    NoSuchUser,

    #[error("Password mismatch")]
    InvalidPassword,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Only .apk files are accepted")]
    InvalidFileType,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Invalid or expired download link")]
    InvalidSignature,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Short label for logs and the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::MissingFields => "missing_fields",
            ServiceError::MissingCredentials => "missing_credentials",
            ServiceError::DuplicateEmail => "duplicate_email",
            ServiceError::DuplicateUsername => "duplicate_username",
            ServiceError::NoSuchUser => "no_such_user",
            ServiceError::InvalidPassword => "invalid_password",
            ServiceError::InvalidCredentials => "invalid_credentials",
            ServiceError::Upstream { .. } => "upstream",
            ServiceError::InvalidFileType => "invalid_file_type",
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::NotAuthorized => "not_authorized",
            ServiceError::InvalidSignature => "invalid_signature",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Validation(_) => "validation",
            ServiceError::Database(_) => "database",
            ServiceError::Storage(_) => "storage",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingFields
            | ServiceError::MissingCredentials
            | ServiceError::DuplicateEmail
            | ServiceError::DuplicateUsername
            | ServiceError::InvalidFileType => AppError::BadRequest(anyhow::anyhow!(err.to_string())),
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::NoSuchUser
            | ServiceError::InvalidPassword
            | ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!(INVALID_CREDENTIALS))
            }
            ServiceError::Unauthenticated | ServiceError::InvalidSignature => {
                AppError::Unauthorized(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::NotAuthorized => AppError::Forbidden(anyhow::anyhow!("Not authorized")),
            ServiceError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ServiceError::Upstream { status, message } => AppError::Upstream { status, message },
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Storage(e) => AppError::StorageError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
