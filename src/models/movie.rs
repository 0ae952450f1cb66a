use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MovieId;

/// A catalog movie. Only `id` matters to the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Payload for adding a movie to the catalog
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewMovie {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
}

impl NewMovie {
    /// Rejects movies without a usable title
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Movie title must not be empty".to_string());
        }
        Ok(())
    }
}
