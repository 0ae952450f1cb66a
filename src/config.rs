use serde::Deserialize;

use crate::services::engine::SelectorSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. The in-memory store is used when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the caller does not ask for a limit
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Largest limit a caller may request
    #[serde(default = "default_max_recommendation_limit")]
    pub max_recommendation_limit: usize,

    /// Minimum score for a neighbour's rating to count as "liked"
    #[serde(default = "default_liked_threshold")]
    pub liked_threshold: f64,

    /// Neighbours must have similarity strictly above this value
    #[serde(default)]
    pub min_similarity: f64,

    /// Optional cap on how many neighbours are consulted
    #[serde(default)]
    pub max_similar_users: Option<usize>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_limit() -> usize {
    5
}

fn default_max_recommendation_limit() -> usize {
    50
}

fn default_liked_threshold() -> f64 {
    4.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            host: default_host(),
            port: default_port(),
            recommendation_limit: default_recommendation_limit(),
            max_recommendation_limit: default_max_recommendation_limit(),
            liked_threshold: default_liked_threshold(),
            min_similarity: 0.0,
            max_similar_users: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Selection policy knobs handed to the recommendation selector
    pub fn selector_settings(&self) -> SelectorSettings {
        SelectorSettings {
            liked_threshold: self.liked_threshold,
            min_similarity: self.min_similarity,
            max_similar_users: self.max_similar_users,
        }
    }
}
