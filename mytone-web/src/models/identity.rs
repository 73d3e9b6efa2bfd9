//! Identities resolved at login and the rows backing them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Page a freshly signed-in identity lands on.
    pub fn home(&self) -> &'static str {
        match self {
            Role::User => "/dashboard",
            Role::Admin => "/admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A verified principal, before it is wrapped into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: Role,
}

/// Row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.to_string(),
            email: Some(self.email.clone()),
            username: Some(self.username.clone()),
            display_name: Some(format!("{} {}", self.name, self.surname).trim().to_string()),
            role: Role::User,
        }
    }

    /// Public view of the account. Never carries the password hash.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id,
            name: self.name.clone(),
            surname: self.surname.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUser {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Row of the `admins` table.
#[derive(Debug, Clone, FromRow)]
pub struct AdminRecord {
    pub id: i64,
    pub username: String,
    pub password: String,
}

impl AdminRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.to_string(),
            email: None,
            username: Some(self.username.clone()),
            display_name: Some(self.username.clone()),
            role: Role::Admin,
        }
    }
}

/// Registration payload after hashing; `password_hash` is a PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_home() {
        assert_eq!(Role::Admin.home(), "/admin");
        assert_eq!(Role::User.home(), "/dashboard");
    }

    #[test]
    fn test_sanitized_user_has_no_password() {
        let record = UserRecord {
            id: 7,
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(record.sanitized()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "ada");
        assert_eq!(record.identity().display_name.as_deref(), Some("Ada Lovelace"));
    }
}
