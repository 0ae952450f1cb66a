use std::sync::Arc;

use crate::{
    config::Config,
    db::{CatalogStore, InMemoryStore, RatingStore},
    services::RecommendationService,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub recommendations: RecommendationService,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(&Config::default())
    }
}

impl AppState {
    /// Wires both store roles to the same backing store
    pub fn with_store<S>(store: Arc<S>, config: &Config) -> Self
    where
        S: RatingStore + CatalogStore + 'static,
    {
        let ratings: Arc<dyn RatingStore> = store.clone();
        Self {
            catalog: store,
            recommendations: RecommendationService::new(ratings, config.selector_settings()),
            default_limit: config.recommendation_limit,
            max_limit: config.max_recommendation_limit,
        }
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(config: &Config) -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), config)
    }
}
