//! PostgreSQL-backed identity and news stores.

use async_trait::async_trait;
use mytone_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::DatabaseConfig;
use crate::models::{AdminRecord, NewUser, NewsDraft, NewsItem, UserRecord};
use crate::services::error::ServiceError;

/// Accounts used by the local credential strategy and by registration.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Matches either the email or the username, as stored.
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, ServiceError>;

    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, ServiceError>;

    async fn email_exists(&self, email: &str) -> Result<bool, ServiceError>;

    async fn username_exists(&self, username: &str) -> Result<bool, ServiceError>;

    /// Fails with `DuplicateEmail`/`DuplicateUsername` on a unique violation.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, ServiceError>;
}

#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Newest first.
    async fn list_news(&self) -> Result<Vec<NewsItem>, ServiceError>;

    async fn create_news(&self, draft: NewsDraft) -> Result<NewsItem, ServiceError>;
}

const NEWS_COLUMNS: &str = "id, created_at, \
    news_title_en, news_description_en, news_title_fr, news_description_fr, \
    news_title_es, news_description_es, news_title_it, news_description_it, \
    news_title_de, news_description_de, news_title_zh, news_description_zh";

const USER_COLUMNS: &str = "id, name, surname, email, username, password, created_at";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[instrument(skip(config), fields(service = "mytone-web"))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn map_unique_violation(err: sqlx::Error) -> ServiceError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_email_key") => return ServiceError::DuplicateEmail,
                Some("users_username_key") => return ServiceError::DuplicateUsername,
                _ => {}
            }
        }
    }
    ServiceError::Database(err)
}

#[async_trait]
impl IdentityStore for Database {
    #[instrument(skip(self, identifier))]
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, ServiceError> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $1 LIMIT 1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserRecord>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, ServiceError> {
        let admin = sqlx::query_as::<_, AdminRecord>(
            "SELECT id, username, password FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, ServiceError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ServiceError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, ServiceError> {
        let query = format!(
            "INSERT INTO users (name, surname, email, username, password) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRecord>(&query)
            .bind(&user.name)
            .bind(&user.surname)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }
}

#[async_trait]
impl NewsStore for Database {
    #[instrument(skip(self))]
    async fn list_news(&self) -> Result<Vec<NewsItem>, ServiceError> {
        let query = format!("SELECT {} FROM news ORDER BY created_at DESC, id DESC", NEWS_COLUMNS);
        let items = sqlx::query_as::<_, NewsItem>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    #[instrument(skip(self, draft))]
    async fn create_news(&self, draft: NewsDraft) -> Result<NewsItem, ServiceError> {
        let query = format!(
            "INSERT INTO news ( \
                news_title_en, news_description_en, news_title_fr, news_description_fr, \
                news_title_es, news_description_es, news_title_it, news_description_it, \
                news_title_de, news_description_de, news_title_zh, news_description_zh) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
            NEWS_COLUMNS
        );
        let item = sqlx::query_as::<_, NewsItem>(&query)
            .bind(draft.en.title)
            .bind(draft.en.description)
            .bind(draft.fr.title)
            .bind(draft.fr.description)
            .bind(draft.es.title)
            .bind(draft.es.description)
            .bind(draft.it.title)
            .bind(draft.it.description)
            .bind(draft.de.title)
            .bind(draft.de.description)
            .bind(draft.zh.title)
            .bind(draft.zh.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn test_connect() {
        let config = DatabaseConfig {
            url: "postgres://localhost/mytone_test".to_string(),
            max_connections: 2,
            min_connections: 1,
        };

        let db = Database::connect(&config).await.unwrap();
        assert!(db.health_check().await.is_ok());
    }
}
