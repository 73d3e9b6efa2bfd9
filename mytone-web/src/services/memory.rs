//! Mutex-backed stores for tests and local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::models::{AdminRecord, NewUser, NewsDraft, NewsItem, UserRecord};
use crate::services::database::{IdentityStore, NewsStore};
use crate::services::error::ServiceError;
use crate::utils::{hash_password, Password};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    admins: Vec<AdminRecord>,
    news: Vec<NewsItem>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, ServiceError> {
        self.tables
            .lock()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("In-memory store mutex poisoned: {}", e)))
    }

    /// Insert an admin with an Argon2 hash of `password`.
    pub fn seed_admin(&self, username: &str, password: &str) -> Result<AdminRecord, ServiceError> {
        let hash = hash_password(&Password::new(password))?;
        let mut tables = self.lock()?;
        let admin = AdminRecord {
            id: tables.next_id(),
            username: username.to_string(),
            password: hash.into_string(),
        };
        tables.admins.push(admin.clone());
        Ok(admin)
    }

    pub fn user_count(&self) -> usize {
        self.lock().map(|t| t.users.len()).unwrap_or_default()
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, ServiceError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.email == identifier || u.username == identifier)
            .cloned())
    }

    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, ServiceError> {
        Ok(self
            .lock()?
            .admins
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, ServiceError> {
        Ok(self.lock()?.users.iter().any(|u| u.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ServiceError> {
        Ok(self.lock()?.users.iter().any(|u| u.username == username))
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, ServiceError> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(ServiceError::DuplicateEmail);
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(ServiceError::DuplicateUsername);
        }

        let record = UserRecord {
            id: tables.next_id(),
            name: user.name,
            surname: user.surname,
            email: user.email,
            username: user.username,
            password: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl NewsStore for InMemoryStore {
    async fn list_news(&self) -> Result<Vec<NewsItem>, ServiceError> {
        let mut items = self.lock()?.news.clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn create_news(&self, draft: NewsDraft) -> Result<NewsItem, ServiceError> {
        let mut tables = self.lock()?;
        let item = NewsItem::from_draft(tables.next_id(), Utc::now(), draft);
        tables.news.push(item.clone());
        Ok(item)
    }
}
