use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Username must not be empty".to_string());
        }
        if !self.email.contains('@') {
            return Err(format!("Invalid email address: {}", self.email));
        }
        Ok(())
    }
}
